pub mod descriptor;
pub mod enrollment;
pub mod extractor;
pub mod maintenance;
pub mod matcher;
pub mod store;

pub use descriptor::{
    distance, is_match, largest_face, Descriptor, DescriptorLengthError, Point, Rectangle,
    DESCRIPTOR_LEN, TOLERANCE,
};

pub use enrollment::{
    run_face_enrollment_with, validate_identity, FaceEnrollmentConfig, FaceEnrollmentOutcome,
    SkippedImage, MAX_ENROLLMENT_IMAGES, MIN_ENROLLMENT_IMAGES, MIN_ENROLLMENT_SAMPLES,
};

pub use extractor::{
    default_extractor, EnvModelPathResolver, FaceExtractor, FaceModelConfig, FaceModelPaths,
    ImageSource, ModelPathResolver,
};

#[cfg(feature = "dlib")]
pub use extractor::DlibExtractor;

pub use maintenance::{
    run_sample_clear_with, run_sample_listing_with, run_sample_removal_with, SampleClearOutcome,
    SampleListingOutcome, SampleRemovalOutcome,
};

pub use matcher::{
    run_face_detection_with, run_face_identification_with, score_identity, FaceDetectionConfig,
    FaceDetectionOutcome, FaceIdentificationConfig, FaceIdentificationOutcome,
    IdentificationDecision, IdentityScore, MatchResult, MIN_MATCHES_REQUIRED,
};

pub use store::{
    identity_store_path, DescriptorStore, EnrolledIdentity, EnvStoreDirResolver,
    FilesystemDescriptorStore, MemoryDescriptorStore, StoreDirResolver, StoredSample,
    DEFAULT_STORE_DIR,
};
