//! Output classes and their integer ids.

use std::fmt;
use std::str::FromStr;

use crate::error::DmsLabelError;

/// A class the detector is trained on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassLabel {
    EyeClosed,
    MouthOpen,
    Phone,
    Cigar,
}

impl ClassLabel {
    /// All classes in canonical id order.
    pub const ALL: [ClassLabel; 4] = [
        ClassLabel::EyeClosed,
        ClassLabel::MouthOpen,
        ClassLabel::Phone,
        ClassLabel::Cigar,
    ];

    /// Name used in the dataset descriptor and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ClassLabel::EyeClosed => "eye_closed",
            ClassLabel::MouthOpen => "mouth_open",
            ClassLabel::Phone => "phone",
            ClassLabel::Cigar => "cigar",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassLabel {
    type Err = DmsLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ClassLabel::ALL
            .into_iter()
            .find(|label| label.name() == trimmed)
            .ok_or_else(|| DmsLabelError::InvalidClassMap {
                message: format!(
                    "unknown class '{}' (expected one of: eye_closed, mouth_open, phone, cigar)",
                    trimmed
                ),
            })
    }
}

/// Assignment of a label-file class id to every [`ClassLabel`].
///
/// The id of a class is its position in `order`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMap {
    order: [ClassLabel; 4],
}

impl Default for ClassMap {
    /// `eye_closed -> 0, mouth_open -> 1, phone -> 2, cigar -> 3`.
    fn default() -> Self {
        Self {
            order: ClassLabel::ALL,
        }
    }
}

impl ClassMap {
    /// Builds a map from class names listed in id order.
    ///
    /// The list must name every class exactly once, so no derived detection
    /// can go without an id.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, DmsLabelError> {
        if names.len() != ClassLabel::ALL.len() {
            return Err(DmsLabelError::InvalidClassMap {
                message: format!(
                    "expected {} class names, got {}",
                    ClassLabel::ALL.len(),
                    names.len()
                ),
            });
        }

        let mut order = ClassLabel::ALL;
        for (slot, name) in order.iter_mut().zip(names) {
            *slot = name.as_ref().parse()?;
        }

        for (i, label) in order.iter().enumerate() {
            if order[..i].contains(label) {
                return Err(DmsLabelError::InvalidClassMap {
                    message: format!("class '{}' is listed more than once", label),
                });
            }
        }

        Ok(Self { order })
    }

    /// Class id written to label files.
    pub fn id(&self, label: ClassLabel) -> u32 {
        self.order
            .iter()
            .position(|l| *l == label)
            .map(|i| i as u32)
            .unwrap_or_default()
    }

    /// Class for an id read back from a label file.
    pub fn label(&self, id: u32) -> Option<ClassLabel> {
        self.order.get(id as usize).copied()
    }

    /// Classes in id order.
    pub fn labels(&self) -> &[ClassLabel] {
        &self.order
    }
}
