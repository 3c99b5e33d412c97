use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of components in a face descriptor vector.
pub const DESCRIPTOR_LEN: usize = 128;

/// Squared-distance threshold below which two descriptors are the same face.
pub const TOLERANCE: f32 = 0.25;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Bounding region of a detected face in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rectangle {
    pub min: Point,
    pub max: Point,
}

impl Rectangle {
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min: Point { x: min_x, y: min_y },
            max: Point { x: max_x, y: max_y },
        }
    }

    pub fn area(&self) -> i64 {
        (self.max.x - self.min.x) * (self.max.y - self.min.y)
    }
}

/// A 128-dimensional face feature vector plus the region it was extracted from.
///
/// Serialized as `{"descriptor": [..128 floats..], "rectangle": {...}}`; decoding
/// rejects vectors of any other length.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorRecord", into = "DescriptorRecord")]
pub struct Descriptor {
    vector: [f32; DESCRIPTOR_LEN],
    rectangle: Rectangle,
}

impl Descriptor {
    pub fn new(vector: [f32; DESCRIPTOR_LEN], rectangle: Rectangle) -> Self {
        Self { vector, rectangle }
    }

    /// Builds a descriptor from a slice, failing unless it holds exactly 128 values.
    pub fn from_slice(values: &[f32], rectangle: Rectangle) -> Result<Self, DescriptorLengthError> {
        let vector: [f32; DESCRIPTOR_LEN] = values
            .try_into()
            .map_err(|_| DescriptorLengthError { found: values.len() })?;
        Ok(Self { vector, rectangle })
    }

    pub fn vector(&self) -> &[f32; DESCRIPTOR_LEN] {
        &self.vector
    }

    pub fn rectangle(&self) -> &Rectangle {
        &self.rectangle
    }

    pub fn distance(&self, other: &Descriptor) -> f32 {
        distance(self, other)
    }

    pub fn is_match(&self, other: &Descriptor) -> bool {
        is_match(self, other)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("vector", &format_args!("[f32; {DESCRIPTOR_LEN}]"))
            .field("rectangle", &self.rectangle)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("descriptor must have {} components, found {found}", DESCRIPTOR_LEN)]
pub struct DescriptorLengthError {
    pub found: usize,
}

#[derive(Serialize, Deserialize)]
struct DescriptorRecord {
    descriptor: Vec<f32>,
    rectangle: Rectangle,
}

impl TryFrom<DescriptorRecord> for Descriptor {
    type Error = DescriptorLengthError;

    fn try_from(record: DescriptorRecord) -> Result<Self, Self::Error> {
        Descriptor::from_slice(&record.descriptor, record.rectangle)
    }
}

impl From<Descriptor> for DescriptorRecord {
    fn from(descriptor: Descriptor) -> Self {
        DescriptorRecord {
            descriptor: descriptor.vector.to_vec(),
            rectangle: descriptor.rectangle,
        }
    }
}

/// Squared Euclidean distance. No square root is taken; [`TOLERANCE`] is
/// calibrated against the squared value.
pub fn distance(lhs: &Descriptor, rhs: &Descriptor) -> f32 {
    let mut sum = 0.0f32;
    for (l, r) in lhs.vector.iter().zip(rhs.vector.iter()) {
        let diff = l - r;
        sum += diff * diff;
    }
    sum
}

pub fn is_match(lhs: &Descriptor, rhs: &Descriptor) -> bool {
    distance(lhs, rhs) < TOLERANCE
}

/// Picks the face with the largest bounding-box area. Ties go to the first
/// face seen; returns `None` for an empty slice.
pub fn largest_face(faces: &[Descriptor]) -> Option<&Descriptor> {
    let mut best: Option<&Descriptor> = None;
    for face in faces {
        match best {
            Some(current) if face.rectangle.area() <= current.rectangle.area() => {}
            _ => best = Some(face),
        }
    }
    best
}
