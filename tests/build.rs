mod common;

use crate::common::{list_tree, write_tree};

use pagefire::{PagefireError, Site, find_templates};
use std::fs;
use tempfile::tempdir;
use tera::Context;

#[test]
fn test_end_to_end_site() {
  // 1. Setup: a template tree with a partial, a hidden file and a nested page.
  let temp_dir = tempdir().unwrap();
  let templates = temp_dir.path().join("templates");
  let out = temp_dir.path().join("public");
  write_tree(
    &templates,
    &[
      ("index.haml", "{% include \"_partial.haml\" %} home"),
      ("_partial.haml", "[nav]"),
      (".hidden", "not a template {{"),
      ("sub/page.haml", "{{ title }}"),
    ],
  );

  // 2. Discovery only sees the renderable templates.
  let discovered: Vec<String> = find_templates(&templates).map(|t| t.name().to_string()).collect();
  assert_eq!(discovered, vec!["index.haml", "sub/page.haml"]);

  // 3. Build.
  let site = Site::builder(&templates)
    .output_root(&out)
    .register_context("sub/page.haml", || {
      let mut context = Context::new();
      context.insert("title", "Nested");
      Ok(context)
    })
    .build()
    .unwrap();
  let report = site.build().unwrap();

  // 4. Exactly one page per renderable template.
  assert_eq!(report.rendered, vec![out.join("index.html"), out.join("sub").join("page.html")]);
  assert_eq!(list_tree(&out), vec!["index.html", "sub/page.html"]);
  assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "[nav] home");
  assert_eq!(fs::read_to_string(out.join("sub").join("page.html")).unwrap(), "Nested");
}

#[test]
fn test_rebuild_is_idempotent() {
  let temp_dir = tempdir().unwrap();
  let templates = temp_dir.path().join("templates");
  let out = temp_dir.path().join("out");
  write_tree(
    &templates,
    &[
      ("people.html", "<ul>{% for p in people %}<li>{{ p.name }} ({{ p.city }})</li>{% endfor %}</ul>"),
      ("about.html", "{{ site_name }}"),
    ],
  );
  write_tree(temp_dir.path(), &[("people.csv", "name,city\nAda,London\nGrace,Arlington\n")]);

  let site = Site::builder(&templates)
    .output_root(&out)
    .add_global("site_name", "Pagefire")
    .register_csv("people.html", "people", temp_dir.path().join("people.csv"))
    .build()
    .unwrap();

  site.build().unwrap();
  let first = (
    fs::read(out.join("people.html")).unwrap(),
    fs::read(out.join("about.html")).unwrap(),
  );
  site.build().unwrap();
  let second = (
    fs::read(out.join("people.html")).unwrap(),
    fs::read(out.join("about.html")).unwrap(),
  );

  assert_eq!(first, second);
  assert_eq!(
    String::from_utf8(first.0).unwrap(),
    "<ul><li>Ada (London)</li><li>Grace (Arlington)</li></ul>"
  );
}

#[test]
fn test_unregistered_template_renders_with_empty_context() {
  let temp_dir = tempdir().unwrap();
  let templates = temp_dir.path().join("templates");
  let out = temp_dir.path().join("out");
  write_tree(&templates, &[("index.html", "{% if title is defined %}titled{% else %}bare{% endif %}")]);

  let site = Site::builder(&templates).output_root(&out).build().unwrap();
  site.build().unwrap();

  assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "bare");
}

#[test]
fn test_malformed_csv_aborts_build() {
  let temp_dir = tempdir().unwrap();
  let templates = temp_dir.path().join("templates");
  let out = temp_dir.path().join("out");
  write_tree(&templates, &[("table.html", "{{ rows | length }}")]);
  write_tree(temp_dir.path(), &[("bad.csv", "a,b\n1\n")]);

  let site = Site::builder(&templates)
    .output_root(&out)
    .register_csv("table.html", "rows", temp_dir.path().join("bad.csv"))
    .build()
    .unwrap();

  let err = site.build().unwrap_err();
  match err {
    PagefireError::Context { template, .. } => assert_eq!(template, "table.html"),
    other => panic!("unexpected error: {other:?}"),
  }
  assert!(!out.join("table.html").exists());
}
