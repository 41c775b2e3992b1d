//! End-to-end builds sharing one state directory, the way repeated CLI runs do.

use pretty_assertions::assert_eq;
use simple_blog::archive::Topic;
use simple_blog::pipeline::{BuildError, Pipeline};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    content: TempDir,
    work: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            content: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        };
        ws.write("about/about.md", &doc("About", "01/01/2020", "Me."));
        ws.write("index/index.md", &doc("Home", "01/01/2020", "Hello."));
        ws
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.content.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn remove(&self, rel: &str) {
        fs::remove_file(self.content.path().join(rel)).unwrap();
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            self.content.path(),
            &self.dist(),
            &self.work.path().join("state"),
        )
    }

    fn dist(&self) -> PathBuf {
        self.work.path().join("dist")
    }

    fn read_output(&self, rel: &str) -> String {
        fs::read_to_string(self.dist().join(rel)).unwrap()
    }
}

fn doc(title: &str, date: &str, body: &str) -> String {
    format!("title: {title}\ndate: {date}\n\n{body}\n")
}

fn titles(topic: &Topic) -> Vec<&str> {
    topic.pages().map(|p| p.title.as_str()).collect()
}

fn topic_names(topic: &Topic) -> Vec<&str> {
    topic.topics().map(|t| t.name.as_str()).collect()
}

#[test]
fn new_article_is_appended_to_its_topic() {
    let ws = Workspace::new();
    ws.write("article/a/x.md", &doc("X", "01/01/2020", "x"));
    ws.write("article/b/y.md", &doc("Y", "02/01/2020", "y"));
    ws.pipeline().run().unwrap();

    ws.write("article/a/z.md", &doc("Z", "03/01/2020", "z"));
    let report = ws.pipeline().run().unwrap();

    let root = &report.site.archive.root;
    assert_eq!(topic_names(root), vec!["a", "b"]);
    assert_eq!(titles(root.topic("a").unwrap()), vec!["X", "Z"]);
    assert_eq!(titles(root.topic("b").unwrap()), vec!["Y"]);

    let archive = ws.read_output("archive.html");
    let x = archive.find(">X<").unwrap();
    let z = archive.find(">Z<").unwrap();
    let y = archive.find(">Y<").unwrap();
    assert!(x < z && z < y);
}

#[test]
fn date_change_does_not_reorder_known_articles() {
    let ws = Workspace::new();
    ws.write("article/a/x.md", &doc("X", "01/01/2020", "x"));
    ws.write("article/a/w.md", &doc("W", "05/01/2020", "w"));
    ws.write("article/b/y.md", &doc("Y", "02/01/2020", "y"));
    ws.pipeline().run().unwrap();

    // X now dates after W but keeps its place.
    ws.write("article/a/x.md", &doc("X", "09/09/2020", "x"));
    let report = ws.pipeline().run().unwrap();

    assert_eq!(
        titles(report.site.archive.root.topic("a").unwrap()),
        vec!["X", "W"]
    );
}

#[test]
fn deleted_article_leaves_the_archive() {
    let ws = Workspace::new();
    ws.write("article/a/x.md", &doc("X", "01/01/2020", "x"));
    ws.write("article/b/y.md", &doc("Y", "02/01/2020", "y"));
    ws.pipeline().run().unwrap();

    ws.remove("article/b/y.md");
    let report = ws.pipeline().run().unwrap();

    assert_eq!(report.site.archive.len(), 1);
    assert!(!ws.dist().join("article/y.html").exists());
}

#[test]
fn check_does_not_advance_the_snapshot() {
    let ws = Workspace::new();
    ws.write("article/a/x.md", &doc("X", "01/01/2020", "x"));
    ws.write("article/b/y.md", &doc("Y", "02/01/2020", "y"));
    let pipeline = ws.pipeline();
    pipeline.run().unwrap();
    let snapshot = fs::read_to_string(pipeline.store().path()).unwrap();

    ws.write("article/a/z.md", &doc("Z", "03/01/2020", "z"));
    pipeline.check().unwrap();

    assert_eq!(fs::read_to_string(pipeline.store().path()).unwrap(), snapshot);
}

#[test]
fn missing_about_page_is_an_error() {
    let ws = Workspace::new();
    ws.remove("about/about.md");
    ws.write("article/a/x.md", &doc("X", "01/01/2020", "x"));

    let err = ws.pipeline().run().unwrap_err();
    assert!(matches!(err, BuildError::Generate(_)));
    assert!(err.to_string().contains("about"));
}

#[test]
fn mixed_depth_topic_is_stable_across_builds() {
    let ws = Workspace::new();
    ws.write("article/t/b.md", &doc("B", "01/01/2020", "b"));
    ws.write("article/t/sub/a.md", &doc("A", "02/01/2020", "a"));
    ws.write("article/t/c.md", &doc("C", "03/01/2020", "c"));
    let pipeline = ws.pipeline();
    let first = pipeline.run().unwrap();
    let snapshot = fs::read_to_string(pipeline.store().path()).unwrap();

    let root = &first.site.archive.root;
    assert!(titles(root).is_empty());
    assert_eq!(topic_names(root), vec!["t"]);
    let t = root.topic("t").unwrap();
    assert_eq!(titles(t), vec!["B", "C"]);
    assert_eq!(titles(t.topic("sub").unwrap()), vec!["A"]);

    let second = pipeline.run().unwrap();
    assert_eq!(second.site.archive, first.site.archive);
    assert_eq!(fs::read_to_string(pipeline.store().path()).unwrap(), snapshot);
}
