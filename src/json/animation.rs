use crate::extensions::Extensions;
use super::{Extras, Unclassified};

string_enum!(Interpolation {
	Linear = "LINEAR",
	Step = "STEP",
	CubicSpline = "CUBICSPLINE",
});

impl Default for Interpolation {
	fn default() -> Self {
		Interpolation::Linear
	}
}

string_enum!(AnimationPath {
	Translation = "translation",
	Rotation = "rotation",
	Scale = "scale",
	Weights = "weights",
});

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
	pub channels: Vec<Channel>,
	pub samplers: Vec<AnimationSampler>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
	pub sampler: usize,
	pub target: ChannelTarget,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTarget {
	pub node: Option<usize>,
	pub path: AnimationPath,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSampler {
	pub input: usize,
	#[serde(default)]
	pub interpolation: Interpolation,
	pub output: usize,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}
