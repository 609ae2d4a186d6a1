use push_extension_core::error::{ExtensionError, GraphError};
use push_extension_core::orchestration::{operation_fn, GraphBuilder};

#[test]
fn test_malformed_graphs_are_rejected_at_build_time() {
    let mut cyclic = GraphBuilder::new();
    cyclic
        .add_operation("download", operation_fn(|| async { Ok(()) }))
        .add_operation("merge", operation_fn(|| async { Ok(()) }))
        .add_dependency("merge", "download")
        .add_dependency("download", "merge");

    let err: ExtensionError = cyclic.build().unwrap_err().into();
    assert!(matches!(
        err,
        ExtensionError::Graph(GraphError::CycleDetected { .. })
    ));

    let mut dangling = GraphBuilder::new();
    dangling
        .add_operation("report", operation_fn(|| async { Ok(()) }))
        .add_dependency("report", "merge");
    assert!(dangling.build().unwrap_err().to_string().contains("unknown operation 'merge'"));
}
