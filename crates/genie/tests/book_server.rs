use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::thread;

use tempfile::TempDir;

struct Route {
    path: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

fn json(path: &'static str, body: &str) -> Route {
    Route {
        path,
        content_type: "application/json",
        body: body.as_bytes().to_vec(),
    }
}

fn png(path: &'static str, rgba: [u8; 4]) -> Route {
    let image = image::RgbaImage::from_pixel(8, 12, image::Rgba(rgba));
    let mut body = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut body), image::ImageFormat::Png)
        .expect("encode png");
    Route {
        path,
        content_type: "image/png",
        body,
    }
}

/// Serves `routes` on an ephemeral port until the test process exits.
fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            respond(stream, &routes);
        }
    });
    format!("http://{addr}")
}

fn respond(mut stream: TcpStream, routes: &[Route]) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, content_type, body) = match routes.iter().find(|route| route.path == path) {
        Some(route) => ("200 OK", route.content_type, route.body.as_slice()),
        None => ("404 Not Found", "text/plain", b"not found".as_slice()),
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn book_library() -> String {
    serve(vec![
        json(
            "/books",
            r#"{ "books": [
                { "id": "zeta", "title": "Zeta Tales", "author": "Z. Writer", "num_scenes": 1 },
                { "id": null, "title": "Orphan" },
                { "id": "alice", "title": "Alice", "author": null, "num_scenes": 3 }
            ] }"#,
        ),
        json(
            "/books/alice",
            r#"{
                "id": "alice",
                "title": "Alice",
                "author": null,
                "num_scenes": 3,
                "scenes": [
                    { "index": 0, "text": "Down the rabbit hole.", "image_url": "/static/alice/red.png" },
                    { "index": 1, "text": "A pool of tears.", "image_file": "blue.png" },
                    { "index": 2, "text": "The lost picture.", "image_file": "missing.png" }
                ]
            }"#,
        ),
        png("/static/alice/red.png", [255, 0, 0, 255]),
        png("/static/alice/blue.png", [0, 0, 255, 255]),
    ])
}

fn genie(config_dir: &Path, server: &str, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_genie"));
    for proxy in ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
        command.env_remove(proxy);
    }
    command
        .env("GENIE_CONFIG_DIR", config_dir)
        .env_remove("GENIE_SERVER")
        .env("RUST_LOG", "warn")
        .arg("--server")
        .arg(server)
        .args(args)
        .output()
        .expect("failed to run genie")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn books_are_listed_by_id() {
    let root = TempDir::new().unwrap();
    let server = book_library();

    let output = genie(root.path(), &server, &["books"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2, "{text}");
    assert!(lines[0].starts_with("alice"), "{text}");
    assert!(lines[0].contains("Author: unknown"), "{text}");
    assert!(lines[0].contains("3 scenes"), "{text}");
    assert!(lines[1].starts_with("zeta"), "{text}");
    assert!(lines[1].contains("Author: Z. Writer"), "{text}");
    assert!(!text.contains("Orphan"), "{text}");
}

#[test]
fn reading_fades_through_every_scene_and_back_to_the_menu() {
    let root = TempDir::new().unwrap();
    let server = book_library();

    let output = genie(root.path(), &server, &["read", "alice", "--fps", "50"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.starts_with("Alice by unknown"), "{text}");
    assert!(text.contains("  scene 1/3 >"), "{text}");
    assert!(text.contains("< scene 3/3"), "{text}");
    assert!(text.contains("A pool of tears."), "{text}");

    let skyboxes: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("  skybox: "))
        .collect();
    assert_eq!(
        skyboxes,
        [
            "  skybox: alice/red.png (8x12 panorama, yaw 90°)  floor: (1.000, 0.000, 0.000, 1.000)",
            "  skybox: alice/blue.png (8x12 panorama, yaw 90°)  floor: (0.000, 0.000, 1.000, 1.000)",
            "  skybox: menu (flat (0.050, 0.050, 0.080, 1.000))  floor: (0.250, 0.250, 0.250, 1.000)",
        ],
        "{text}"
    );

    let last = text.lines().last().expect("output");
    assert_eq!(last, "back at menu  floor: (0.250, 0.250, 0.250, 1.000)");
}

#[test]
fn scene_limit_stops_early() {
    let root = TempDir::new().unwrap();
    let server = book_library();

    let output = genie(root.path(), &server, &["read", "alice", "--scenes", "1"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert_eq!(text.matches("  skybox: ").count(), 1, "{text}");
    assert!(!text.contains("scene 2/3"), "{text}");
    assert!(text.ends_with("back at menu  floor: (0.250, 0.250, 0.250, 1.000)\n"), "{text}");
}

#[test]
fn unknown_book_fails() {
    let root = TempDir::new().unwrap();
    let server = book_library();

    let output = genie(root.path(), &server, &["read", "nobody"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to fetch book 'nobody'"), "{stderr}");
}
