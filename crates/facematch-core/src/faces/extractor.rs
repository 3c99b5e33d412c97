use std::env;
use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "dlib")]
use dlib_face_recognition::{
    FaceDetector, FaceDetectorTrait, FaceEncoderNetwork, FaceEncoderTrait, ImageMatrix,
    LandmarkPredictor, LandmarkPredictorTrait,
};
use image::RgbImage;
#[cfg(feature = "dlib")]
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::faces::descriptor::Descriptor;
#[cfg(feature = "dlib")]
use crate::faces::descriptor::Rectangle;

const LANDMARK_ENV: &str = "DLIB_LANDMARK_MODEL";
const ENCODER_ENV: &str = "DLIB_ENCODER_MODEL";

/// An already-validated image handed over by the transport layer.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes { label: String, data: Vec<u8> },
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    pub fn bytes(label: impl Into<String>, data: Vec<u8>) -> Self {
        ImageSource::Bytes {
            label: label.into(),
            data,
        }
    }

    /// Name used in logs and error messages.
    pub fn label(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes { label, .. } => label.clone(),
        }
    }

    pub fn decode_rgb(&self) -> AppResult<RgbImage> {
        let image = match self {
            ImageSource::Path(path) => {
                if !path.exists() {
                    return Err(AppError::MissingInput { path: path.clone() });
                }
                image::open(path).map_err(|source| AppError::ImageDecode {
                    label: self.label(),
                    source,
                })?
            }
            ImageSource::Bytes { data, .. } => {
                image::load_from_memory(data).map_err(|source| AppError::ImageDecode {
                    label: self.label(),
                    source,
                })?
            }
        };
        Ok(image.to_rgb8())
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Bytes { label, data } => f
                .debug_struct("Bytes")
                .field("label", label)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Turns an image into zero or more face descriptors.
///
/// An empty result means no face was found and is not an error.
pub trait FaceExtractor {
    fn detect_faces(&self, image: &ImageSource) -> AppResult<Vec<Descriptor>>;
}

impl<T: FaceExtractor + ?Sized> FaceExtractor for &T {
    fn detect_faces(&self, image: &ImageSource) -> AppResult<Vec<Descriptor>> {
        (**self).detect_faces(image)
    }
}

impl<T: FaceExtractor + ?Sized> FaceExtractor for Box<T> {
    fn detect_faces(&self, image: &ImageSource) -> AppResult<Vec<Descriptor>> {
        (**self).detect_faces(image)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaceModelConfig {
    pub landmark_model: Option<PathBuf>,
    pub encoder_model: Option<PathBuf>,
    pub jitters: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceModelPaths {
    pub landmark: PathBuf,
    pub encoder: PathBuf,
}

pub trait ModelPathResolver {
    fn resolve(&self, config: &FaceModelConfig) -> AppResult<FaceModelPaths>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvModelPathResolver;

impl ModelPathResolver for EnvModelPathResolver {
    fn resolve(&self, config: &FaceModelConfig) -> AppResult<FaceModelPaths> {
        let landmark = config
            .landmark_model
            .clone()
            .or_else(|| env::var(LANDMARK_ENV).ok().map(PathBuf::from))
            .ok_or(AppError::MissingModel {
                kind: "landmark predictor",
                flag: "--landmark-model",
                env: LANDMARK_ENV,
            })?;

        let encoder = config
            .encoder_model
            .clone()
            .or_else(|| env::var(ENCODER_ENV).ok().map(PathBuf::from))
            .ok_or(AppError::MissingModel {
                kind: "face encoding network",
                flag: "--encoder-model",
                env: ENCODER_ENV,
            })?;

        Ok(FaceModelPaths { landmark, encoder })
    }
}

/// Builds the default extractor for this build.
///
/// Without the `dlib` feature there is no vision backend and this fails with
/// [`AppError::BackendUnavailable`].
pub fn default_extractor(config: &FaceModelConfig) -> AppResult<Box<dyn FaceExtractor>> {
    #[cfg(feature = "dlib")]
    {
        let models = EnvModelPathResolver.resolve(config)?;
        let backend = DlibExtractor::new(&models, config.jitters)?;
        Ok(Box::new(backend))
    }
    #[cfg(not(feature = "dlib"))]
    {
        let _ = config;
        Err(AppError::BackendUnavailable(
            "facematch was built without the `dlib` feature".into(),
        ))
    }
}

#[cfg(feature = "dlib")]
pub struct DlibExtractor {
    detector: FaceDetector,
    predictor: LandmarkPredictor,
    encoder: FaceEncoderNetwork,
    jitters: u32,
}

#[cfg(feature = "dlib")]
impl DlibExtractor {
    pub fn new(models: &FaceModelPaths, jitters: u32) -> AppResult<Self> {
        debug!(path = %models.landmark.display(), "loading landmark model");
        let predictor =
            LandmarkPredictor::open(&models.landmark).map_err(|message| AppError::ModelLoad {
                path: models.landmark.clone(),
                message,
            })?;
        debug!(path = %models.encoder.display(), "loading encoder model");
        let encoder =
            FaceEncoderNetwork::open(&models.encoder).map_err(|message| AppError::ModelLoad {
                path: models.encoder.clone(),
                message,
            })?;
        let detector = FaceDetector::new();

        Ok(Self {
            detector,
            predictor,
            encoder,
            jitters: jitters.max(1),
        })
    }
}

#[cfg(feature = "dlib")]
impl FaceExtractor for DlibExtractor {
    fn detect_faces(&self, image: &ImageSource) -> AppResult<Vec<Descriptor>> {
        let rgb = image.decode_rgb()?;
        let matrix = ImageMatrix::from_image(&rgb);
        let locations = self.detector.face_locations(&matrix);

        let mut landmarks = Vec::with_capacity(locations.len());
        for rect in locations.iter() {
            landmarks.push(self.predictor.face_landmarks(&matrix, rect));
        }

        let encodings = self
            .encoder
            .get_face_encodings(&matrix, &landmarks, self.jitters);

        let mut descriptors = Vec::with_capacity(locations.len());
        for (rect, encoding) in locations.iter().zip(encodings.iter()) {
            let values: Vec<f32> = encoding.as_ref().iter().map(|v| *v as f32).collect();
            let rectangle = Rectangle::new(rect.left, rect.top, rect.right, rect.bottom);
            let descriptor =
                Descriptor::from_slice(&values, rectangle).map_err(|err| AppError::Extraction {
                    label: image.label(),
                    message: err.to_string(),
                })?;
            descriptors.push(descriptor);
        }

        debug!(image = %image.label(), faces = descriptors.len(), "extracted descriptors");
        Ok(descriptors)
    }
}
