//! Comprehensive tests for the tree builder
//!
//! Tests cover grouping, filtering, aggregation of signed sizes, sort order,
//! chain collapsing, snapshots and the error cases of the builder.

use symtree_domain::{
    BuilderConfig, ContainerKind, EntryOutcome, FileEntry, FinalizePolicy, GroupBy, NodeSnapshot,
    SymbolEntry, SymbolType, Tree, TreeBuilder, TypeFilter,
};

fn symbol(name: &str, size: f64, code: char) -> SymbolEntry {
    SymbolEntry::new(name, size, SymbolType::from_code(code))
}

fn source_builder() -> TreeBuilder {
    TreeBuilder::new(BuilderConfig::new(GroupBy::SourcePath)).unwrap()
}

fn names(snapshot: &NodeSnapshot) -> Vec<&str> {
    snapshot
        .children
        .iter()
        .map(|child| child.short_name.as_str())
        .collect()
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_signed_sizes_aggregate_and_sort_by_magnitude() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new("a/b/x.cc", vec![symbol("Foo", 100.0, 't')]))
        .unwrap();
    builder
        .add_entry(&FileEntry::new("a/b/y.cc", vec![symbol("Bar", -40.0, 't')]))
        .unwrap();
    assert_eq!(builder.root_size(), 60.0);

    let tree = builder.build();
    tree.check_invariants().unwrap();
    let snapshot = tree.snapshot(false);
    let dir = snapshot.find("a/b").unwrap();
    assert_eq!(dir.size, 60.0);
    assert_eq!(names(dir), ["x.cc", "y.cc"]);
    assert_eq!(dir.children[1].size, -40.0);
}

#[test]
fn test_negative_sort_precedes_smaller_positive() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new(
            "f.cc",
            vec![symbol("grow", 10.0, 't'), symbol("shrink", -300.0, 'd')],
        ))
        .unwrap();
    let snapshot = builder.build().snapshot(false);
    let file = snapshot.find("f.cc").unwrap();
    assert_eq!(names(file), ["shrink", "grow"]);
    assert_eq!(file.node_type.to_string(), "Ft");
}

#[test]
fn test_child_sizes_track_every_type() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new(
            "base/x.cc",
            vec![
                symbol("code", 30.0, 't'),
                symbol("table", 50.0, 'r'),
                symbol("zero", 0.0, 'b'),
            ],
        ))
        .unwrap();
    let tree = builder.build();
    let root = tree.root_node();
    assert_eq!(root.child_sizes().get(SymbolType::Code), Some(30.0));
    assert_eq!(root.child_sizes().get(SymbolType::ReadOnly), Some(50.0));
    assert_eq!(root.child_sizes().get(SymbolType::Bss), Some(0.0));
    assert_eq!(root.child_sizes().get(SymbolType::Data), None);
    assert_eq!(root.node_type().to_string(), "Dr");
}

#[test]
fn test_dominant_type_ties_use_canonical_order() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new(
            "x.cc",
            vec![symbol("v", 8.0, 'v'), symbol("d", 8.0, 'd')],
        ))
        .unwrap();
    assert_eq!(builder.tree().root_node().node_type().to_string(), "Dd");
}

#[test]
fn test_unknown_type_codes_count_as_other() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new("x.cc", vec![symbol("odd", 4.0, 'Q')]))
        .unwrap();
    let tree = builder.tree();
    assert_eq!(tree.root_node().child_sizes().get(SymbolType::Other), Some(4.0));
}

// ============================================================================
// Grouping
// ============================================================================

#[test]
fn test_component_grouping_prefixes_component() {
    let mut builder = TreeBuilder::new(BuilderConfig::new(GroupBy::Component)).unwrap();
    builder.set_components(vec!["Core".to_string()]);
    builder
        .add_entry(&FileEntry::new("base/x.cc", vec![symbol("Foo", 12.0, 't')]).with_component(0))
        .unwrap();

    let snapshot = builder.snapshot();
    let core = snapshot.child("Core").unwrap();
    assert_eq!(core.node_type.kind(), Some(ContainerKind::Component));
    let file = snapshot.find("Core>base/x.cc").unwrap();
    assert!(file.id_path.starts_with("Core>"));
    assert_eq!(file.short_name, "x.cc");
}

#[test]
fn test_component_grouping_without_component() {
    let mut builder = TreeBuilder::new(BuilderConfig::new(GroupBy::Component)).unwrap();
    builder
        .add_entry(&FileEntry::new("x.cc", vec![symbol("Foo", 1.0, 't')]))
        .unwrap();
    assert!(builder.snapshot().child("(No component)").is_some());
}

#[test]
fn test_custom_separator() {
    let config = BuilderConfig::new(GroupBy::SourcePath).with_separator("::");
    let mut builder = TreeBuilder::new(config).unwrap();
    builder
        .add_entry(&FileEntry::new("ns::inner::file", vec![symbol("f", 2.0, 't')]))
        .unwrap();
    let snapshot = builder.snapshot();
    assert_eq!(snapshot.id_path, "::");
    let inner = snapshot.find("ns::inner").unwrap();
    assert_eq!(inner.short_name, "inner");
    assert_eq!(names(inner), ["file"]);
}

// ============================================================================
// Filtering and count mode
// ============================================================================

#[test]
fn test_filtered_record_leaves_no_trace() {
    let config = BuilderConfig::new(GroupBy::SourcePath).with_types(TypeFilter::of(SymbolType::Code));
    let mut builder = TreeBuilder::new(config).unwrap();
    let outcome = builder
        .add_entry(&FileEntry::new("deep/dir/data.cc", vec![symbol("kTable", 64.0, 'r')]))
        .unwrap();

    assert_eq!(outcome, EntryOutcome::Skipped { filtered: 1 });
    assert!(builder.tree().is_empty());
    assert!(builder.tree().find("deep").is_none());
    assert_eq!(builder.stats().skipped_files, 1);
    assert_eq!(builder.stats().containers, 0);
}

#[test]
fn test_empty_filter_yields_empty_root() {
    let config = BuilderConfig::new(GroupBy::SourcePath).with_types(TypeFilter::empty());
    let mut builder = TreeBuilder::new(config).unwrap();
    for path in ["a.cc", "b/c.cc"] {
        builder
            .add_entry(&FileEntry::new(path, vec![symbol("s", 9.0, 't')]))
            .unwrap();
    }
    let tree = builder.build();
    assert_eq!(tree.root_node().size(), 0.0);
    assert!(tree.is_empty());
}

#[test]
fn test_explicit_types_replace_defaults() {
    let config =
        BuilderConfig::new(GroupBy::SourcePath).with_types(TypeFilter::from_codes("bd"));
    let mut builder = TreeBuilder::new(config).unwrap();
    builder
        .add_entry(&FileEntry::new(
            "x.cc",
            vec![symbol("b", 1.0, 'b'), symbol("d", 2.0, 'd'), symbol("t", 4.0, 't')],
        ))
        .unwrap();
    assert_eq!(builder.root_size(), 3.0);
    assert_eq!(builder.stats().filtered_symbols, 1);
}

#[test]
fn test_count_mode_ignores_sizes() {
    let config = BuilderConfig::new(GroupBy::SourcePath)
        .with_count_mode(true)
        .with_types(TypeFilter::method_count());
    let mut builder = TreeBuilder::new(config).unwrap();
    builder
        .add_entry(&FileEntry::new(
            "com/A.java",
            vec![symbol("a", 120.0, 'm'), symbol("b", -3.0, 'm')],
        ))
        .unwrap();
    builder
        .add_entry(&FileEntry::new("com/B.java", vec![symbol("c", 7.0, 'm')]))
        .unwrap();
    assert_eq!(builder.root_size(), 3.0);
    assert_eq!(builder.tree().root_node().node_type().to_string(), "Dm");
}

// ============================================================================
// Name and path collisions
// ============================================================================

fn build_in_order(entries: &[FileEntry]) -> Tree {
    let mut builder = source_builder();
    for entry in entries {
        builder.add_entry(entry).unwrap();
    }
    builder.build()
}

#[test]
fn test_same_name_different_types_is_order_independent() {
    let code = FileEntry::new("x.cc", vec![symbol("Foo", 10.0, 't')]);
    let data = FileEntry::new("x.cc", vec![symbol("Foo", 5.0, 'd')]);

    let forward = build_in_order(&[code.clone(), data.clone()]);
    let backward = build_in_order(&[data, code]);
    assert_eq!(forward.snapshot(false), backward.snapshot(false));

    assert!(forward.find("x.cc:Foo").is_none());
    let foo_code = forward.find("x.cc:Foo#t").and_then(|id| forward.get(id)).unwrap();
    assert_eq!(foo_code.size(), 10.0);
    assert_eq!(foo_code.short_name(), "Foo");
    assert!(forward.find("x.cc:Foo#d").is_some());
    forward.check_invariants().unwrap();
}

#[test]
fn test_third_type_joins_suffixed_leaves() {
    let tree = build_in_order(&[FileEntry::new(
        "x.cc",
        vec![
            symbol("Foo", 1.0, 't'),
            symbol("Foo", 2.0, 'd'),
            symbol("Foo", 4.0, 'r'),
            symbol("Foo", 8.0, 't'),
        ],
    )]);
    let file = tree.find("x.cc").unwrap();
    let mut paths: Vec<_> = tree.children(file).map(|leaf| leaf.id_path().to_string()).collect();
    paths.sort();
    assert_eq!(paths, ["x.cc:Foo#d", "x.cc:Foo#r", "x.cc:Foo#t"]);
    assert_eq!(tree.root_node().size(), 15.0);
}

#[test]
fn test_file_sharing_a_directory_path_is_order_independent() {
    let file = FileEntry::new("a", vec![symbol("Top", 3.0, 't')]);
    let nested = FileEntry::new("a/x.cc", vec![symbol("Deep", 7.0, 't')]);

    let forward = build_in_order(&[file.clone(), nested.clone()]);
    let backward = build_in_order(&[nested, file]);
    assert_eq!(forward.snapshot(false), backward.snapshot(false));

    let shared = forward.find("a").and_then(|id| forward.get(id)).unwrap();
    assert_eq!(shared.node_type().kind(), Some(ContainerKind::File));
    assert_eq!(shared.size(), 10.0);
    forward.check_invariants().unwrap();
}

// ============================================================================
// Finalisation
// ============================================================================

fn java_tree(finalize: FinalizePolicy) -> Tree {
    let config = BuilderConfig::new(GroupBy::SourcePath).with_finalize(finalize);
    let mut builder = TreeBuilder::new(config).unwrap();
    builder
        .add_entry(&FileEntry::new(
            "java/com/google/A.java",
            vec![symbol("run", 10.0, 'm'), symbol("stop", 4.0, 'm')],
        ))
        .unwrap();
    builder
        .add_entry(&FileEntry::new(
            "java/com/google/B.java",
            vec![symbol("go", 6.0, 'm')],
        ))
        .unwrap();
    builder.build()
}

#[test]
fn test_collapse_joins_chain_names() {
    let tree = java_tree(FinalizePolicy {
        collapse_chains: true,
        expand_sole_child: false,
    });
    tree.check_invariants().unwrap();
    let snapshot = tree.snapshot(false);
    assert_eq!(names(&snapshot), ["java/com/google"]);
    let merged = &snapshot.children[0];
    assert_eq!(merged.size, 20.0);
    assert_eq!(names(merged), ["A.java", "B.java"]);
}

#[test]
fn test_collapse_is_idempotent() {
    let mut tree = java_tree(FinalizePolicy {
        collapse_chains: true,
        expand_sole_child: false,
    });
    let once = tree.snapshot(false);
    tree.collapse_chains();
    assert_eq!(tree.snapshot(false), once);
}

#[test]
fn test_expand_without_collapse_marks_chain() {
    let tree = java_tree(FinalizePolicy::default());
    let snapshot = tree.snapshot(true);
    assert!(snapshot.expand);
    let java = snapshot.child("java").unwrap();
    assert!(java.expand);
    let google = snapshot.find("java/com/google").unwrap();
    assert!(!google.expand);
}

#[test]
fn test_collapse_stops_at_type_change() {
    let config = BuilderConfig::new(GroupBy::SourcePath).with_finalize(FinalizePolicy {
        collapse_chains: true,
        expand_sole_child: false,
    });
    let mut builder = TreeBuilder::new(config).unwrap();
    builder
        .add_entry(&FileEntry::new("a/b/x.cc", vec![symbol("f", 1.0, 't')]))
        .unwrap();
    let snapshot = builder.build().snapshot(false);
    let merged = &snapshot.children[0];
    assert_eq!(merged.short_name, "a/b");
    assert_eq!(names(merged), ["x.cc"]);
}

// ============================================================================
// Snapshots and stats
// ============================================================================

#[test]
fn test_snapshot_is_detached_from_builder() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new("x.cc", vec![symbol("a", 1.0, 't')]))
        .unwrap();
    let early = builder.snapshot();
    builder
        .add_entry(&FileEntry::new("y.cc", vec![symbol("b", 2.0, 't')]))
        .unwrap();
    assert_eq!(early.size, 1.0);
    assert_eq!(early.children.len(), 1);
    assert_eq!(builder.snapshot().size, 3.0);
}

#[test]
fn test_snapshot_serializes_camel_case() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new("x.cc", vec![symbol("a", 1.5, 't')]))
        .unwrap();
    let json = serde_json::to_value(builder.snapshot()).unwrap();
    assert_eq!(json["idPath"], "/");
    assert_eq!(json["type"], "Dt");
    assert_eq!(json["childSizes"]["t"], 1.5);
    assert_eq!(json["children"][0]["shortName"], "x.cc");
}

#[test]
fn test_stats_count_everything() {
    let mut builder = source_builder();
    builder
        .add_entry(&FileEntry::new("a/x.cc", vec![symbol("a", 1.0, 't')]))
        .unwrap();
    builder
        .add_entry(&FileEntry::new("a/y.cc", vec![symbol("b", 1.0, 't')]))
        .unwrap();
    builder.add_entry(&FileEntry::new("a/z.cc", vec![])).unwrap();

    let stats = builder.stats();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.skipped_files, 1);
    assert_eq!(stats.symbols, 2);
    assert_eq!(stats.containers, 1);
}
