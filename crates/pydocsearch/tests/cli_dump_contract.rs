use axum::{http::header, routing::get, Router};
use std::net::SocketAddr;

const GENINDEX: &str = include_str!("../fixtures/genindex-all.html");

async fn serve_docs() -> SocketAddr {
    let app = Router::new().route(
        "/:version/genindex-all.html",
        get(|| async { ([(header::CONTENT_TYPE, "text/html")], GENINDEX) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn run(addr: SocketAddr, args: &[&str]) -> std::process::Output {
    let bin = assert_cmd::cargo::cargo_bin!("pydocsearch");
    tokio::process::Command::new(bin)
        .args(args)
        .args(["--base-url", &format!("http://{addr}/{{version}}/")])
        .output()
        .await
        .expect("run pydocsearch")
}

#[tokio::test]
async fn pydocsearch_light_dump_is_sorted_keyword_best_link() {
    let addr = serve_docs().await;
    let out = run(addr, &["light-dump"]).await;
    assert!(out.status.success(), "light-dump failed: {out:?}");
    let s = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = s.lines().collect();

    assert!(lines.contains(&"lambda glossary.html#term-lambda"));
    assert!(lines.contains(&"exit library/sys.html#sys.exit"));
    assert!(lines.contains(&"sys library/sys.html"));
    assert!(lines.contains(&"abs() (built-in function) library/functions.html#abs"));

    let keywords: Vec<&str> = lines
        .iter()
        .map(|l| l.rsplit_once(' ').map_or(*l, |(k, _)| k))
        .collect();
    let mut sorted = keywords.clone();
    sorted.sort();
    assert_eq!(keywords, sorted, "light-dump must be sorted by keyword");
}

#[tokio::test]
async fn pydocsearch_dump_marks_best_candidate() {
    let addr = serve_docs().await;
    let out = run(addr, &["dump"]).await;
    assert!(out.status.success(), "dump failed: {out:?}");
    let s = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = s.lines().collect();

    let at = lines.iter().position(|l| *l == "wait").expect("wait entry");
    let block = &lines[at + 1..at + 3];
    assert!(block.iter().any(|l| l.starts_with(" ->  library/os.html#os.wait ")));
    assert!(block
        .iter()
        .any(|l| l.starts_with(" --  library/asyncio-subprocess.html#")));
}

#[tokio::test]
async fn pydocsearch_dump_json_contract() {
    let addr = serve_docs().await;
    let out = run(addr, &["dump", "--output", "json", "--version", "3.6"]).await;
    assert!(out.status.success(), "dump failed: {out:?}");
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse dump json");

    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["kind"].as_str(), Some("dump"));
    assert_eq!(v["version"].as_str(), Some("3.6"));
    let expected_base = format!("http://{addr}/3.6/");
    assert_eq!(v["index"]["base_url"].as_str(), Some(expected_base.as_str()));

    let str_entry = &v["index"]["entries"]["__str__"];
    assert_eq!(
        str_entry["best_link"].as_str(),
        Some("reference/datamodel.html#object.__str__")
    );
    assert_eq!(str_entry["candidates"].as_object().map(|m| m.len()), Some(2));
    let keywords = v["keywords"].as_u64().unwrap_or(0);
    assert_eq!(
        v["index"]["entries"].as_object().map(|m| m.len() as u64),
        Some(keywords)
    );
}
