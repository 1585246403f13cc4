//! Full pipeline over a small traced MLP: ingest, prune, collapse, build,
//! export, including parameter association.

use pretty_assertions::assert_eq;
use visumod::config::PipelineConfig;
use visumod::graph::RawRecord;
use visumod::pipeline;

fn mlp_trace() -> Vec<RawRecord> {
    serde_json::from_str(
        r#"[
            {"name": "input.1", "op": "aten::ones",
             "attributes": {"_output_shapes": [[1, 784]]}},
            {"name": "Net/Flatten[flat]/shape", "op": "prim::Constant"},
            {"name": "Net/Flatten[flat]/flatten", "op": "aten::flatten",
             "input": ["input.1", "Net/Flatten[flat]/shape"],
             "attributes": {"_output_shapes": [[1, 784]]}},
            {"name": "Net/Linear[fc1]/weight/weight.1", "op": "prim::GetAttr",
             "attributes": {"_output_shapes": [[128, 784]]}},
            {"name": "Net/Linear[fc1]/bias/bias.1", "op": "prim::GetAttr",
             "attributes": {"_output_shapes": [[128]]}},
            {"name": "Net/Linear[fc1]/addmm", "op": "aten::addmm",
             "input": ["Net/Linear[fc1]/bias/bias.1",
                       "Net/Flatten[flat]/flatten",
                       "Net/Linear[fc1]/weight/weight.1"],
             "attributes": {"_output_shapes": [[1, 128]]}},
            {"name": "Net/ReLU[act]/relu", "op": "aten::relu",
             "input": ["Net/Linear[fc1]/addmm"],
             "attributes": {"_output_shapes": [[1, 128]]}},
            {"name": "Net/Linear[fc2]/weight/weight.1", "op": "prim::GetAttr",
             "attributes": {"_output_shapes": [[10, 128]]}},
            {"name": "Net/Linear[fc2]/addmm", "op": "aten::addmm",
             "input": ["Net/ReLU[act]/relu", "Net/Linear[fc2]/weight/weight.1"],
             "attributes": {"_output_shapes": [[1, 10]]}}
        ]"#,
    )
    .unwrap()
}

fn mlp_params() -> Vec<String> {
    ["fc1.weight", "fc1.bias", "fc2.weight"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[test]
fn builds_expected_module_tree() {
    let cfg = PipelineConfig::default();
    let md = pipeline::build(mlp_trace(), Some(&mlp_params()), &cfg).unwrap();

    // Single-child levels (Flatten[flat], ReLU[act]) collapsed away; the
    // branching ones survived.
    let paths: Vec<&str> = md.module_paths().collect();
    assert_eq!(
        paths,
        vec!["", "Net/", "Net/Linear[fc1]/", "Net/Linear[fc2]/"]
    );

    let net = md.module("Net/").unwrap();
    assert!(net.op_nodes.contains("(Flatten[flat])flatten"));
    assert!(net.op_nodes.contains("(ReLU[act])relu"));
    assert!(net.modules.contains("Linear[fc1]"));
    assert!(net.modules.contains("Linear[fc2]"));

    // Parameter leaves folded into visu::param nodes; primitives are gone.
    let fc1 = md.module("Net/Linear[fc1]/").unwrap();
    assert!(fc1.op_nodes.contains("weight"));
    assert!(fc1.op_nodes.contains("bias"));
    assert!(fc1.op_nodes.contains("addmm"));
    assert_eq!(md.nodes()["Net/Linear[fc1]/weight"].op, "visu::param");
    assert!(!md.nodes().contains_key("Net/Flatten[flat]/shape"));

    // Input positions survived pruning and renaming.
    assert_eq!(
        md.nodes()["Net/Linear[fc1]/addmm"].input,
        vec![
            "Net/Linear[fc1]/bias".to_string(),
            "Net/(Flatten[flat])flatten".to_string(),
            "Net/Linear[fc1]/weight".to_string(),
        ]
    );

    // Bracket-indexed parameter association at every ancestor level.
    assert!(net.params.contains("fc1.weight"));
    assert!(fc1.params.contains("fc1.weight"));
    assert!(fc1.params.contains("fc1.bias"));
    assert!(!fc1.params.contains("fc2.weight"));
}

#[test]
fn boundary_edges_are_symmetric() {
    let cfg = PipelineConfig::default();
    let md = pipeline::build(mlp_trace(), Some(&mlp_params()), &cfg).unwrap();

    let fc1 = md.module("Net/Linear[fc1]/").unwrap();
    assert!(fc1.in_nodes.contains("Net/(Flatten[flat])flatten"));
    assert!(fc1.out_nodes.contains("Net/(ReLU[act])relu"));
    assert!(fc1.in_shapes.contains(&vec![1, 784]));
    assert!(fc1.out_shapes.contains(&vec![1, 128]));

    let fc2 = md.module("Net/Linear[fc2]/").unwrap();
    assert!(fc2.in_nodes.contains("Net/(ReLU[act])relu"));
    assert!(fc2.out_nodes.is_empty());

    // The graph input feeds Net/ from outside.
    let net = md.module("Net/").unwrap();
    assert!(net.in_nodes.contains("input.1"));
}

#[test]
fn export_is_local_and_self_consistent() {
    let cfg = PipelineConfig::default();
    let md = pipeline::build(mlp_trace(), Some(&mlp_params()), &cfg).unwrap();

    let export = md.export("Net/").unwrap();
    assert_eq!(export.inputs, vec!["input.1".to_string()]);
    assert!(export.outputs.is_empty());

    // The flatten op's consumer sits inside fc1; the edge names the
    // submodule, not the deep node.
    let flatten = &export.meta["Net/(Flatten[flat])flatten"];
    assert_eq!(flatten.input, vec!["input.1".to_string()]);
    assert_eq!(flatten.output, vec!["Net/Linear[fc1]/".to_string()]);

    // Synthetic submodule entries aggregate boundary data and params.
    let fc1 = &export.meta["Net/Linear[fc1]/"];
    assert_eq!(fc1.op, "visu::module");
    assert_eq!(fc1.input, vec!["Net/(Flatten[flat])flatten".to_string()]);
    assert_eq!(fc1.output, vec!["Net/(ReLU[act])relu".to_string()]);
    assert_eq!(
        fc1.params,
        Some(vec!["fc1.bias".to_string(), "fc1.weight".to_string()])
    );
    assert_eq!(fc1.output_shapes, vec![vec![1, 128]]);

    // The boundary in-node is a source at this level.
    let input = &export.meta["input.1"];
    assert!(input.input.is_empty());

    // No reference escapes one level below Net/.
    for view in export.meta.values() {
        for link in view.input.iter().chain(view.output.iter()) {
            let depth = link.trim_end_matches('/').split('/').count();
            assert!(depth <= 2, "link {link:?} escapes the exported level");
        }
    }
}

#[test]
fn export_serializes_to_contract_shape() {
    let cfg = PipelineConfig::default();
    let md = pipeline::build(mlp_trace(), Some(&mlp_params()), &cfg).unwrap();

    let value = serde_json::to_value(md.export("Net/Linear[fc1]/").unwrap()).unwrap();
    assert!(value.get("meta").is_some());
    assert!(value.get("inputs").is_some());
    assert!(value.get("outputs").is_some());

    let weight = &value["meta"]["Net/Linear[fc1]/weight"];
    assert_eq!(weight["op"], "visu::param");
    // Plain nodes carry no params field.
    assert!(weight.get("params").is_none());
}

#[test]
fn unknown_module_export_fails_cleanly() {
    let cfg = PipelineConfig::default();
    let md = pipeline::build(mlp_trace(), None, &cfg).unwrap();
    assert!(md.export("Net/Dropout[drop]/").is_err());
}
