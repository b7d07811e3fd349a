use glam::Mat4;

use crate::{
	accessor::{AccessorError, Resolver, Usage},
	diagnostics::{Code, Diagnostic, Severity},
	json::{AnimationPath, Interpolation},
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnimationError {
	#[error("{kind} {index} does not exist")]
	Missing { kind: &'static str, index: usize },
	#[error("channel {channel} references sampler {sampler} which does not exist")]
	MissingSampler { channel: usize, sampler: usize },
	#[error("channel {channel} has {outputs} output values for {times} key times")]
	KeyCountMismatch { channel: usize, times: usize, outputs: usize },
	#[error("skin has {matrices} inverse bind matrices for {joints} joints")]
	JointCountMismatch { joints: usize, matrices: usize },
	#[error(transparent)]
	Accessor(#[from] AccessorError),
}

impl AnimationError {
	pub fn code(&self) -> Code {
		match self {
			AnimationError::Missing { .. } | AnimationError::MissingSampler { .. } => Code::MissingReference,
			AnimationError::KeyCountMismatch { .. } | AnimationError::JointCountMismatch { .. } => Code::AnimationInvalid,
			AnimationError::Accessor(e) => e.code(),
		}
	}

	/// `who` names the animation or skin being resolved.
	pub fn diagnostic(&self, who: &str) -> Diagnostic {
		let args = match self {
			AnimationError::Missing { kind, index } => vec!["document".to_string(), kind.to_string(), index.to_string()],
			AnimationError::MissingSampler { channel, sampler } => vec![
				format!("{who} channel {channel}"), "sampler".to_string(), sampler.to_string(),
			],
			AnimationError::Accessor(e) => e.args(who),
			_ => vec![who.to_string(), self.to_string()],
		};
		Diagnostic::new(Severity::Error, self.code(), args)
	}
}

/// Key frames of one animated property.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelData {
	pub node: Option<usize>,
	pub path: AnimationPath,
	pub interpolation: Interpolation,
	pub times: Vec<f32>,
	/// Output components for every key, flattened.
	///
	/// Cubic spline keys hold in-tangent, value and out-tangent in that order.
	pub values: Vec<f32>,
	/// Components per output element, 4 for rotations and 1 for morph weights.
	pub components: usize,
}

impl ChannelData {
	/// Number of output elements per key time, [None] if there are no keys.
	pub fn elements_per_key(&self) -> Option<usize> {
		let elements = self.values.len().checked_div(self.components)?;
		elements.checked_div(self.times.len())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationData {
	pub name: Option<String>,
	pub channels: Vec<ChannelData>,
}

impl AnimationData {
	/// Time of the last key over every channel.
	pub fn duration(&self) -> f32 {
		self.channels.iter().filter_map(|c| c.times.last()).fold(0.0, |a, b| a.max(*b))
	}
}

pub fn resolve_animation(resolver: &Resolver<'_>, index: usize) -> Result<AnimationData, AnimationError> {
	let animation = resolver.document().animations.get(index)
		.ok_or(AnimationError::Missing { kind: "animation", index })?;
	let channels = animation.channels.iter().enumerate().map(|(c, channel)| {
		let sampler = animation.samplers.get(channel.sampler)
			.ok_or(AnimationError::MissingSampler { channel: c, sampler: channel.sampler })?;
		let times = resolver.resolve_for(sampler.input, &Usage::AnimationInput)?.to_flat_f32();
		let output = resolver.resolve_for(sampler.output, &Usage::AnimationOutput)?;
		if !times.is_empty() && output.len() % times.len() != 0 {
			return Err(AnimationError::KeyCountMismatch { channel: c, times: times.len(), outputs: output.len() });
		}
		Ok(ChannelData {
			node: channel.target.node,
			path: channel.target.path.clone(),
			interpolation: sampler.interpolation.clone(),
			components: output.components(),
			values: output.to_flat_f32(),
			times,
		})
	}).collect::<Result<Vec<_>, AnimationError>>()?;
	Ok(AnimationData { name: animation.name.clone(), channels })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinData {
	pub name: Option<String>,
	pub skeleton: Option<usize>,
	pub joints: Vec<usize>,
	/// One matrix per joint, identity when the skin has none.
	pub inverse_bind_matrices: Vec<Mat4>,
}

pub fn resolve_skin(resolver: &Resolver<'_>, index: usize) -> Result<SkinData, AnimationError> {
	let skin = resolver.document().skins.get(index)
		.ok_or(AnimationError::Missing { kind: "skin", index })?;
	let inverse_bind_matrices = match skin.inverse_bind_matrices {
		Some(i) => {
			let view = resolver.resolve_for(i, &Usage::InverseBindMatrices)?;
			if view.len() < skin.joints.len() {
				return Err(AnimationError::JointCountMismatch { joints: skin.joints.len(), matrices: view.len() });
			}
			view.to_vecs::<16>(0.0).iter().map(Mat4::from_cols_array).collect()
		},
		None => vec![Mat4::IDENTITY; skin.joints.len()],
	};
	Ok(SkinData {
		name: skin.name.clone(),
		skeleton: skin.skeleton,
		joints: skin.joints.clone(),
		inverse_bind_matrices,
	})
}
