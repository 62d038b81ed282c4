//! Tree traversal for external consumers such as visual builders.
//!
//! Traversal is pre-order: a folder is produced before any of its children,
//! which is the order a renderer needs for correct z-ordering.

use super::feature::Feature;
use super::style::StyleResolver;

/// Pre-order iterator over a feature tree, yielding `(depth, feature)`.
///
/// The root has depth 0.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Feature)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Feature);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, feature) = self.stack.pop()?;
        for child in feature.children().iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, feature))
    }
}

/// Callbacks for a structured walk that also reports where folders end.
pub trait FeatureVisitor {
    fn enter_folder(&mut self, _folder: &Feature, _depth: usize) {}
    fn leave_folder(&mut self, _folder: &Feature, _depth: usize) {}
    fn visit_leaf(&mut self, _feature: &Feature, _depth: usize) {}
}

/// Builds a renderable object for one feature.
///
/// Implemented outside this crate by whatever draws the map. The builder
/// receives read access to the feature and a resolver for its `style_ref`;
/// it must not keep references into either.
pub trait VisualBuilder {
    type Visual;

    fn build(&mut self, feature: &Feature, styles: &dyn StyleResolver) -> Option<Self::Visual>;
}

impl Feature {
    /// Iterate over this feature and all its descendants in pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    /// Drive `visitor` over the subtree in pre-order.
    pub fn accept<V: FeatureVisitor + ?Sized>(&self, visitor: &mut V) {
        self.accept_at(visitor, 0);
    }

    fn accept_at<V: FeatureVisitor + ?Sized>(&self, visitor: &mut V, depth: usize) {
        if self.is_folder() {
            visitor.enter_folder(self, depth);
            for child in self.children() {
                child.accept_at(visitor, depth + 1);
            }
            visitor.leave_folder(self, depth);
        } else {
            visitor.visit_leaf(self, depth);
        }
    }

    /// Run `builder` over every feature in pre-order, collecting what it builds.
    pub fn build_visuals<B: VisualBuilder>(
        &self,
        builder: &mut B,
        styles: &dyn StyleResolver,
    ) -> Vec<B::Visual> {
        self.walk()
            .filter_map(|(_, feature)| builder.build(feature, styles))
            .collect()
    }
}
