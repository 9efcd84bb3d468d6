//! End-to-end loading through the public API.

use std::borrow::Cow;
use std::fs;
use std::sync::Arc;

use ini_directives::preprocess::{expand_for, resolve_if};
use ini_directives::{AnnotationRegistry, Error, IniContext, Item, Loader, StaticHost};

fn loader_on(host: &str) -> Loader {
    Loader::builder().with_host(Arc::new(StaticHost::new(host).with_ip("192.168.1.20".parse().unwrap())))
}

fn values<'a>(ctx: &'a IniContext, section: &str, name: &str) -> Vec<&'a str> {
    ctx.get_values_ex(section, name).iter().map(Item::value).collect()
}

#[test]
fn test_values_are_trimmed_and_loads_are_deterministic() {
    let text = "  name =  demo  \n[net]\n port=  9000\n timeout = 2.5 \n";
    let first = loader_on("h").load_str(text).unwrap();
    let second = loader_on("h").load_str(text).unwrap();

    assert_eq!(first.get_str("", "name"), Some("demo"));
    assert_eq!(first.get_int("net", "port", 0), 9000);
    assert_eq!(first.get_double("net", "timeout", 0.0), 2.5);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_if_on_hostname_without_else() {
    let text = "#@if %{LOCAL_HOST} in [somehost]\nonly_here = 1\n#@endif\nalways = 1\n";

    let matching = loader_on("somehost").load_str(text).unwrap();
    assert_eq!(matching.get_str("", "only_here"), Some("1"));

    let other = loader_on("otherhost").load_str(text).unwrap();
    assert_eq!(other.get_str("", "only_here"), None);
    assert_eq!(other.get_str("", "always"), Some("1"));
}

#[test]
fn test_if_on_local_ip_with_else() {
    let text = "\
[db]
#@if %{LOCAL_IP} in [10.0.0.1, 192.168.1.20]
role = primary
#@else
role = replica
#@endif
";
    let ctx = loader_on("h").load_str(text).unwrap();
    assert_eq!(values(&ctx, "db", "role"), vec!["primary"]);
}

#[test]
fn test_for_loop_expands_in_order() {
    let explicit = loader_on("h")
        .load_str("#@for i from 1 to 3 step 1\nx={$i}\n#@endfor\n")
        .unwrap();
    let implicit = loader_on("h")
        .load_str("#@for i from 1 to 3\nx={$i}\n#@endfor\n")
        .unwrap();

    assert_eq!(values(&explicit, "", "x"), vec!["1", "2", "3"]);
    assert_eq!(values(&implicit, "", "x"), vec!["1", "2", "3"]);
}

#[test]
fn test_for_loop_generates_distinct_keys() {
    let ctx = loader_on("h")
        .load_str("[ports]\n#@for n from 0 to 20 step 10\nport_{$n} = 80{$n}\n#@endfor\n")
        .unwrap();

    assert_eq!(ctx.get_int("ports", "port_0", 0), 800);
    assert_eq!(ctx.get_int("ports", "port_10", 0), 8010);
    assert_eq!(ctx.get_int("ports", "port_20", 0), 8020);
    assert_eq!(ctx.scratch().len(), 1);
}

#[test]
fn test_malformed_for_aborts_load() {
    let result = loader_on("h").load_str("#@for i from 1 until 3\nx={$i}\n#@endfor\n");
    assert!(matches!(result, Err(Error::Directive(_))));
}

#[test]
fn test_annotation_expands_into_items() {
    let registry = Arc::new(
        AnnotationRegistry::new().register_fn("expand", |raw: &str| raw.split(',').map(str::to_string).collect()),
    );
    let ctx = loader_on("h")
        .with_annotations(registry)
        .load_str("[cluster]\nzone = east\n#@function expand\nmember = a,b,c\n")
        .unwrap();

    assert_eq!(values(&ctx, "cluster", "member"), vec!["a", "b", "c"]);
    assert_eq!(ctx.get_values("cluster", "member", 2), vec!["a", "b"]);
    assert_eq!(ctx.get_str("cluster", "zone"), Some("east"));
}

#[test]
fn test_multi_valued_key_is_contiguous() {
    let ctx = loader_on("h")
        .load_str("[s]\nhost = 10.0.0.1\nalpha = 1\nmid = 2\nzulu = 3\nhost = 10.0.0.2\n")
        .unwrap();

    let section = ctx.section_items("s");
    let positions: Vec<usize> = section
        .iter()
        .enumerate()
        .filter(|(_, item)| item.name() == "host")
        .map(|(index, _)| index)
        .collect();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[1], positions[0] + 1);

    let mut hosts = values(&ctx, "s", "host");
    hosts.sort_unstable();
    assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);
}

#[test]
fn test_missing_include_leaves_no_context() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.conf");
    fs::write(&main, "[a]\nk = v\n#include absent.conf\n").unwrap();

    let result = ini_directives::load_file(&main);
    assert!(matches!(result, Err(Error::IncludeNotFound { .. })));
}

#[test]
fn test_include_merges_sections_and_runs_directives() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.conf"),
        "[shared]\nfrom_main = 1\n#include workers.conf\nglobal_after = 1\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("workers.conf"),
        "[shared]\nfrom_include = 1\n[workers]\n#@for w from 1 to 2\nworker = w{$w}\n#@endfor\n",
    )
    .unwrap();

    let ctx = loader_on("h").load_file(dir.path().join("main.conf")).unwrap();
    assert_eq!(ctx.get_str("shared", "from_main"), Some("1"));
    assert_eq!(ctx.get_str("shared", "from_include"), Some("1"));
    assert_eq!(ctx.get_str("", "global_after"), Some("1"));
    assert_eq!(values(&ctx, "workers", "worker"), vec!["w1", "w2"]);
}

#[test]
fn test_load_file_ex_can_ignore_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.conf");
    fs::write(&path, "#@function anything\nk = v\n").unwrap();

    let ctx = ini_directives::load_file_ex(&path, false).unwrap();
    assert!(!ctx.annotations_enabled());
    assert_eq!(ctx.get_str("", "k"), Some("v"));
}

#[test]
fn test_passes_without_markers_are_fixed_points() {
    let text = "[a]\nb = c\n# #@ is only a marker with a keyword\n";
    let host = StaticHost::new("h");

    assert!(matches!(resolve_if(text, &host).unwrap(), Cow::Borrowed(s) if std::ptr::eq(s, text)));
    assert!(matches!(expand_for(text).unwrap(), Cow::Borrowed(s) if std::ptr::eq(s, text)));
}

#[test]
fn test_destroy_releases_context() {
    let ctx = loader_on("h")
        .load_str("#@if %{LOCAL_HOST} in [h]\na = 1\n#@endif\n")
        .unwrap();
    assert_eq!(ctx.scratch().len(), 1);
    ctx.destroy();
}
