/// Emission order for [`super::traverse`] (spec §4.5).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Strategy {
	/// Nodes emitted in non-decreasing depth; within a level, adapter
	/// order grouped by parent.
	#[default]
	Bfs,
	/// Every parent emitted before any of its descendants.
	DfsPre,
	/// Every descendant of a node emitted before the node itself.
	DfsPost,
}
