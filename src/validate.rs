//! Static validation of shape descriptors.
//!
//! [`validate`] is a pure pass over a [`Shape`] that reports every construct the codec
//! would refuse (or misinterpret) at runtime. It touches no buffer and is meant to run
//! once, before a type is first encoded.

use std::collections::HashSet;
use std::fmt;

use crate::fingerprint::Fingerprint;
use crate::shape::Shape;
use crate::strategy::StrategyRegistry;

/// Highest array rank accepted.
pub const MAX_ARRAY_RANK: u8 = 32;

/// What is wrong with a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Array rank outside `1..=MAX_ARRAY_RANK`.
    InvalidRank(u8),
    /// A nullable wrapper around something that is neither fixed-layout nor custom.
    NullableNotFixed(String),
    /// A blittable shape with zero width.
    ZeroWidth,
    /// A composite member with an empty name.
    EmptyMemberName,
    /// Two members of one composite share a name.
    DuplicateMember(String),
    /// A custom shape with no registered strategy.
    MissingStrategy(String),
    /// A union without variants.
    EmptyUnion,
    /// A union variant that does not carry its own presence tag and fingerprint.
    VariantNotPresenceBearing(String),
    /// Two union variants that cannot be told apart by fingerprint.
    AmbiguousVariants(String),
    /// The shape descriptor could not be fingerprinted.
    Unfingerprintable(String),
}

/// One problem found by [`validate`], with the path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location inside the root shape, e.g. `Order.members[lines].element`.
    pub path: String,
    /// What is wrong.
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.path)?;
        match &self.kind {
            ViolationKind::InvalidRank(r) => {
                write!(f, "array rank {r} outside 1..={MAX_ARRAY_RANK}")
            }
            ViolationKind::NullableNotFixed(t) => {
                write!(f, "nullable wrapper around '{t}', which carries its own presence tag")
            }
            ViolationKind::ZeroWidth => write!(f, "blittable shape with zero width"),
            ViolationKind::EmptyMemberName => write!(f, "member with an empty name"),
            ViolationKind::DuplicateMember(m) => write!(f, "duplicate member '{m}'"),
            ViolationKind::MissingStrategy(t) => write!(f, "no strategy registered for '{t}'"),
            ViolationKind::EmptyUnion => write!(f, "union without variants"),
            ViolationKind::VariantNotPresenceBearing(t) => {
                write!(f, "variant '{t}' carries no presence tag")
            }
            ViolationKind::AmbiguousVariants(t) => {
                write!(f, "variants share the fingerprint of '{t}'")
            }
            ViolationKind::Unfingerprintable(e) => write!(f, "cannot fingerprint: {e}"),
        }
    }
}

/// Reports every violation in `shape`. An empty result means the shape is encodable.
pub fn validate(shape: &Shape, registry: &StrategyRegistry) -> Vec<Violation> {
    let mut out = Vec::new();
    walk(shape, shape.type_name().into_owned(), registry, &mut out);
    out
}

fn push(out: &mut Vec<Violation>, path: &str, kind: ViolationKind) {
    out.push(Violation {
        path: path.to_owned(),
        kind,
    });
}

fn walk(shape: &Shape, path: String, registry: &StrategyRegistry, out: &mut Vec<Violation>) {
    match shape {
        Shape::Primitive(_) | Shape::Text => {}
        Shape::Blittable { width, .. } => {
            if *width == 0 {
                push(out, &path, ViolationKind::ZeroWidth);
            }
        }
        Shape::Nullable(inner) => {
            if !inner.is_fixed() && !matches!(**inner, Shape::Custom { .. }) {
                push(
                    out,
                    &path,
                    ViolationKind::NullableNotFixed(inner.type_name().into_owned()),
                );
            }
            walk(inner, format!("{path}.inner"), registry, out);
        }
        Shape::Array { element, rank } => {
            if *rank == 0 || *rank > MAX_ARRAY_RANK {
                push(out, &path, ViolationKind::InvalidRank(*rank));
            }
            walk(element, format!("{path}.element"), registry, out);
        }
        Shape::Sequence { element } => walk(element, format!("{path}.element"), registry, out),
        Shape::Associative { key, value } => {
            walk(key, format!("{path}.key"), registry, out);
            walk(value, format!("{path}.value"), registry, out);
        }
        Shape::Composite { members, .. } => {
            let mut seen = HashSet::new();
            for member in members {
                if member.name.is_empty() {
                    push(out, &path, ViolationKind::EmptyMemberName);
                } else if !seen.insert(member.name.as_str()) {
                    push(out, &path, ViolationKind::DuplicateMember(member.name.clone()));
                }
                walk(
                    &member.shape,
                    format!("{path}.members[{}]", member.name),
                    registry,
                    out,
                );
            }
        }
        Shape::Custom { name } => {
            if !registry.contains(name) {
                push(out, &path, ViolationKind::MissingStrategy(name.clone()));
            }
        }
        Shape::Union { variants, .. } => {
            if variants.is_empty() {
                push(out, &path, ViolationKind::EmptyUnion);
            }
            let mut stamps = HashSet::new();
            for (i, variant) in variants.iter().enumerate() {
                let variant_path = format!("{path}.variants[{i}]");
                let variant_name = variant.type_name().into_owned();
                if !variant.is_presence_bearing() {
                    push(
                        out,
                        &variant_path,
                        ViolationKind::VariantNotPresenceBearing(variant_name.clone()),
                    );
                }
                match Fingerprint::of(variant) {
                    Ok(fp) => {
                        if !stamps.insert(fp) {
                            push(out, &variant_path, ViolationKind::AmbiguousVariants(variant_name));
                        }
                    }
                    Err(e) => push(
                        out,
                        &variant_path,
                        ViolationKind::Unfingerprintable(e.to_string()),
                    ),
                }
                walk(variant, variant_path, registry, out);
            }
        }
    }
}
