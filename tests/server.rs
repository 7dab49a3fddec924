mod common;

use common::{read_response, scratch_dir};
use raw_http_server::endpoints;
use raw_http_server::files::{DirStore, FileStore};
use raw_http_server::http::server::Server;
use std::fs;
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn start(store: Option<Arc<dyn FileStore>>) -> SocketAddr {
    start_with(store, 4, Duration::from_secs(2))
}

fn start_with(
    store: Option<Arc<dyn FileStore>>,
    min_workers: usize,
    read_timeout: Duration,
) -> SocketAddr {
    let router = endpoints::routes(store).unwrap();
    let server = Server::bind("127.0.0.1:0", router, min_workers, read_timeout).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

fn echo_once(stream: &mut TcpStream, rdr: &mut BufReader<TcpStream>, value: &str) {
    stream
        .write_all(format!("GET /echo/{value} HTTP/1.1\r\n\r\n").as_bytes())
        .unwrap();
    assert_eq!(read_response(rdr).unwrap().text(), value);
}

#[test]
fn bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let router = endpoints::routes(None).unwrap();
    assert!(Server::bind(&addr, router, 1, Duration::from_secs(1)).is_err());
}

#[test]
fn keep_alive_over_tcp() {
    let addr = start(None);
    let mut stream = TcpStream::connect(addr).unwrap();
    let mut rdr = BufReader::new(stream.try_clone().unwrap());

    stream.write_all(b"GET /echo/first HTTP/1.1\r\n\r\n").unwrap();
    let first = read_response(&mut rdr).unwrap();
    assert_eq!(first.text(), "first");

    stream
        .write_all(b"GET /echo/second HTTP/1.1\r\nConnection: close\r\n\r\n")
        .unwrap();
    let second = read_response(&mut rdr).unwrap();
    assert_eq!(second.text(), "second");
    assert_eq!(second.header("Connection"), Some("close"));

    // Server has closed its end; nothing more arrives.
    assert!(read_response(&mut rdr).is_none());
}

#[test]
fn concurrent_clients_with_files() {
    let dir = scratch_dir("tcp");
    let addr = start(Some(Arc::new(DirStore::new(&dir))));

    let clients: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let body = format!("payload-{i}");
                let mut stream = TcpStream::connect(addr).unwrap();
                let mut rdr = BufReader::new(stream.try_clone().unwrap());

                write!(
                    stream,
                    "POST /files/f{i} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                )
                .unwrap();
                assert_eq!(read_response(&mut rdr).unwrap().code, 201);

                write!(stream, "GET /files/f{i} HTTP/1.1\r\nConnection: close\r\n\r\n").unwrap();
                let resp = read_response(&mut rdr).unwrap();
                assert_eq!(resp.code, 200);
                assert_eq!(resp.text(), body);
            })
        })
        .collect();

    for c in clients {
        c.join().unwrap();
    }
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn idle_keep_alive_clients_do_not_starve_new_ones() {
    let addr = start_with(None, 2, Duration::from_secs(10));

    let idle: Vec<_> = (0..6)
        .map(|i| {
            let mut stream = TcpStream::connect(addr).unwrap();
            let mut rdr = BufReader::new(stream.try_clone().unwrap());
            echo_once(&mut stream, &mut rdr, &format!("idle-{i}"));
            (stream, rdr)
        })
        .collect();

    let started = Instant::now();
    let mut stream = TcpStream::connect(addr).unwrap();
    let mut rdr = BufReader::new(stream.try_clone().unwrap());
    echo_once(&mut stream, &mut rdr, "late");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "late client waited {:?}",
        started.elapsed()
    );

    drop(idle);
}

#[test]
fn close_request_with_unsent_body_is_answered_at_once() {
    let addr = start_with(None, 1, Duration::from_secs(10));
    let mut stream = TcpStream::connect(addr).unwrap();
    let mut rdr = BufReader::new(stream.try_clone().unwrap());

    let started = Instant::now();
    stream
        .write_all(b"POST /nope HTTP/1.1\r\nContent-Length: 10\r\nConnection: close\r\n\r\n")
        .unwrap();
    let resp = read_response(&mut rdr).unwrap();

    assert_eq!(resp.code, 404);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "answer took {:?}",
        started.elapsed()
    );
}
