//! Pipeline configuration.
//!
//! The tracer-facing conventions (path delimiter, the operator category used
//! for non-tensor bookkeeping ops, parameter leaf segment names, synthetic op
//! names) are carried explicitly through every stage instead of living in
//! global constants.

/// Configuration shared by all pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Separator between path segments in node names.
    pub delimiter: char,
    /// Separator between the category and operator halves of an op name.
    pub op_namespace: String,
    /// Operator category whose nodes are pruned/absorbed.
    pub prim_category: String,
    /// Trailing segments that mark a node as a parameter leaf.
    pub param_leaf_segments: Vec<String>,
    /// Op name given to synthetic module entries on export.
    pub module_op: String,
    /// Op name given to folded parameter nodes.
    pub param_op: String,
    /// Attribute key carrying tensor shapes in raw records.
    pub output_shapes_attr: String,
    /// Pruning worklist cap, as a multiple of the node count. Exceeding it
    /// means the input graph has a cycle.
    pub prune_round_factor: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: '/',
            op_namespace: "::".to_string(),
            prim_category: "prim".to_string(),
            param_leaf_segments: vec!["weight".to_string(), "bias".to_string()],
            module_op: "visu::module".to_string(),
            param_op: "visu::param".to_string(),
            output_shapes_attr: "_output_shapes".to_string(),
            prune_round_factor: 16,
        }
    }
}

impl PipelineConfig {
    /// Category half of an op name (`aten::add` -> `aten`).
    pub fn op_category<'a>(&self, op: &'a str) -> &'a str {
        op.split(&self.op_namespace).next().unwrap_or(op)
    }

    /// True if the op belongs to the pruned bookkeeping category.
    pub fn is_prim(&self, op: &str) -> bool {
        self.op_category(op) == self.prim_category
    }

    /// Splits a node name into its path segments.
    pub fn segments<'a>(&self, name: &'a str) -> Vec<&'a str> {
        name.split(self.delimiter).collect()
    }

    /// Splits a node name into (ancestor module segments, own segment).
    pub fn split_name<'a>(&self, name: &'a str) -> (Vec<&'a str>, &'a str) {
        let mut segments = self.segments(name);
        let own = segments.pop().unwrap_or(name);
        (segments, own)
    }

    /// True if the name denotes a parameter leaf: its last or second-to-last
    /// segment is a leaf marker (`weight`/`bias` by default). Traced graphs
    /// name parameters both `.../weight` and `.../weight/weight.1`.
    pub fn is_param_leaf(&self, name: &str) -> bool {
        let segments = self.segments(name);
        if segments.len() < 2 {
            return false;
        }
        let is_marker = |s: &str| self.param_leaf_segments.iter().any(|m| m == s);
        is_marker(segments[segments.len() - 1]) || is_marker(segments[segments.len() - 2])
    }

    /// Parent path of a name (everything before the final segment).
    pub fn parent_path<'a>(&self, name: &'a str) -> &'a str {
        match name.rfind(self.delimiter) {
            Some(idx) => &name[..idx],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_category_and_prim() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.op_category("aten::add"), "aten");
        assert!(cfg.is_prim("prim::Constant"));
        assert!(!cfg.is_prim("aten::add"));
        assert!(!cfg.is_prim("visu::param"));
    }

    #[test]
    fn split_name_basic() {
        let cfg = PipelineConfig::default();
        let (modules, own) = cfg.split_name("net/fc1/relu");
        assert_eq!(modules, vec!["net", "fc1"]);
        assert_eq!(own, "relu");

        let (modules, own) = cfg.split_name("top");
        assert!(modules.is_empty());
        assert_eq!(own, "top");
    }

    #[test]
    fn param_leaf_detection() {
        let cfg = PipelineConfig::default();
        // Last segment.
        assert!(cfg.is_param_leaf("net/fc1/weight"));
        // Second-to-last segment.
        assert!(cfg.is_param_leaf("net/fc1/weight/weight.1"));
        assert!(cfg.is_param_leaf("net/fc1/bias/bias.1"));
        // Single-segment names never qualify.
        assert!(!cfg.is_param_leaf("weight"));
        assert!(!cfg.is_param_leaf("net/fc1/relu"));
    }

    #[test]
    fn parent_path_strips_last_segment() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.parent_path("a/b/c"), "a/b");
        assert_eq!(cfg.parent_path("a"), "");
    }
}
