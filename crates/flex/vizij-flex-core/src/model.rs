//! Model descriptor: the slice of a studio model the blender needs.
//!
//! Queried once per model change, never per frame.

use serde::{Deserialize, Serialize};

use crate::error::FlexError;

/// A model-local flex controller and its declared output range.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ControllerDesc {
    pub name: String,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "one")]
    pub max: f32,
}

fn one() -> f32 {
    1.0
}

impl ControllerDesc {
    pub fn new(name: &str, min: f32, max: f32) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoneAxis {
    X,
    Y,
    Z,
}

impl BoneAxis {
    #[inline]
    pub fn component(self, v: [f32; 3]) -> f32 {
        match self {
            BoneAxis::X => v[0],
            BoneAxis::Y => v[1],
            BoneAxis::Z => v[2],
        }
    }
}

/// Drives a controller from one component of a bone's local position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoneFlexDriverRule {
    pub bone_index: usize,
    /// Model-local controller index.
    pub controller_index: usize,
    pub axis: BoneAxis,
    pub min: f32,
    pub max: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub controllers: Vec<ControllerDesc>,
    #[serde(default)]
    pub bone_flex_drivers: Vec<BoneFlexDriverRule>,
    /// Number of bones the host pose exposes. Zero leaves driver bone
    /// indices unchecked.
    #[serde(default)]
    pub pose_parameter_count: usize,
}

impl ModelDescriptor {
    pub fn new(name: &str, controllers: Vec<ControllerDesc>) -> Self {
        Self {
            name: name.to_string(),
            controllers,
            bone_flex_drivers: Vec::new(),
            pose_parameter_count: 0,
        }
    }

    pub fn find_controller(&self, name: &str) -> Option<usize> {
        self.controllers.iter().position(|c| c.name == name)
    }

    pub fn validate_basic(&self) -> Result<(), FlexError> {
        let invalid = |reason: String| FlexError::InvalidModel {
            model: self.name.clone(),
            reason,
        };
        for c in &self.controllers {
            if !c.min.is_finite() || !c.max.is_finite() {
                return Err(invalid(format!("controller '{}' has a non-finite range", c.name)));
            }
        }
        for rule in &self.bone_flex_drivers {
            if rule.controller_index >= self.controllers.len() {
                return Err(invalid(format!(
                    "bone driver targets controller {} but the model has {}",
                    rule.controller_index,
                    self.controllers.len()
                )));
            }
            if self.pose_parameter_count > 0 && rule.bone_index >= self.pose_parameter_count {
                return Err(invalid(format!(
                    "bone driver reads bone {} but the pose has {}",
                    rule.bone_index, self.pose_parameter_count
                )));
            }
            if !rule.min.is_finite() || !rule.max.is_finite() {
                return Err(invalid("bone driver has a non-finite range".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let json = r#"{
            "name": "face",
            "controllers": [ { "name": "blink" }, { "name": "eyes_updown", "min": -1, "max": 1 } ],
            "bone_flex_drivers": [
                { "bone_index": 3, "controller_index": 1, "axis": "z", "min": 0.0, "max": 2.0 }
            ]
        }"#;
        let m: ModelDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(m.controllers[0], ControllerDesc::new("blink", 0.0, 1.0));
        assert_eq!(m.find_controller("eyes_updown"), Some(1));
        assert_eq!(m.bone_flex_drivers[0].axis, BoneAxis::Z);
        assert!(m.validate_basic().is_ok());
    }

    #[test]
    fn driver_outside_controller_table_is_invalid() {
        let mut m = ModelDescriptor::new("face", vec![ControllerDesc::new("blink", 0.0, 1.0)]);
        m.bone_flex_drivers.push(BoneFlexDriverRule {
            bone_index: 0,
            controller_index: 4,
            axis: BoneAxis::X,
            min: 0.0,
            max: 1.0,
        });
        assert!(m.validate_basic().is_err());
    }

    #[test]
    fn driver_bone_is_checked_against_pose_size() {
        let mut m = ModelDescriptor::new("face", vec![ControllerDesc::new("jaw_drop", 0.0, 1.0)]);
        m.bone_flex_drivers.push(BoneFlexDriverRule {
            bone_index: 3,
            controller_index: 0,
            axis: BoneAxis::Y,
            min: 0.0,
            max: 1.0,
        });
        assert!(m.validate_basic().is_ok());
        m.pose_parameter_count = 3;
        assert!(matches!(m.validate_basic(), Err(FlexError::InvalidModel { .. })));
        m.pose_parameter_count = 4;
        assert!(m.validate_basic().is_ok());
    }
}
