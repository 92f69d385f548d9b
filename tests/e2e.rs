//! End-to-end scenarios S1-S5 against a local `hyper` server, run over
//! plain HTTP so no TLS profile shaping is involved (spec §8).

use std::convert::Infallible;
use std::net::SocketAddr;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};

async fn spawn_server<F>(handler: F) -> SocketAddr
where
    F: Fn(Request<Body>) -> Response<Body> + Clone + Send + Sync + 'static,
{
    let addr: SocketAddr = ([127, 0, 0, 1], 0).into();
    let make_svc = make_service_fn(move |_conn| {
        let handler = handler.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handler(req)) }
            }))
        }
    });
    let server = Server::bind(&addr).serve(make_svc);
    let bound = server.local_addr();
    tokio::spawn(async move {
        let _ = server.await;
    });
    bound
}

#[tokio::test]
async fn s1_content_length_body_streams_as_lines() {
    let addr = spawn_server(|_req| {
        let lines: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        Response::new(Body::from(lines.join("\n")))
    })
    .await;

    let client = specter::Client::builder().impersonate("chrome-120").build().unwrap();
    let mut stream = client
        .get(format!("http://{addr}/lines"))
        .send_streaming()
        .await
        .unwrap();

    assert_eq!(stream.status(), 200);
    let got = stream.iter_lines().await.unwrap();
    let want: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
    assert_eq!(got, want);
}

#[tokio::test]
async fn s2_chunked_body_streams_as_separate_chunks() {
    let addr = spawn_server(|_req| {
        let (mut sender, body) = Body::channel();
        tokio::spawn(async move {
            for i in 0..5 {
                sender.send_data(format!("chunk{i}\n").into()).await.unwrap();
            }
        });
        Response::new(body)
    })
    .await;

    let client = specter::Client::builder().impersonate("chrome-120").build().unwrap();
    let mut stream = client
        .get(format!("http://{addr}/chunked"))
        .send_streaming()
        .await
        .unwrap();

    assert_eq!(stream.status(), 200);
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next_chunk().await.unwrap() {
        collected.extend_from_slice(&chunk);
    }
    let text = String::from_utf8(collected).unwrap();
    for i in 0..5 {
        assert!(text.contains(&format!("chunk{i}\n")));
    }
}

#[tokio::test]
async fn s3_form_body_is_urlencoded() {
    let addr = spawn_server(|req| {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        Response::new(Body::from(content_type))
    })
    .await;

    let client = specter::Client::builder().impersonate("chrome-120").build().unwrap();
    let mut form = std::collections::HashMap::new();
    form.insert("key".to_string(), "value".to_string());
    let response = client
        .post(format!("http://{addr}/echo"))
        .form(form)
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.text().unwrap(),
        "application/x-www-form-urlencoded; charset=utf-8"
    );
}

#[tokio::test]
async fn s4_json_body_sets_content_type() {
    let addr = spawn_server(|req| {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        Response::new(Body::from(content_type))
    })
    .await;

    let client = specter::Client::builder().impersonate("chrome-120").build().unwrap();
    let response = client
        .post(format!("http://{addr}/echo"))
        .json(serde_json::json!({"a": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().unwrap(), "application/json");
}

#[tokio::test]
async fn s5_session_sets_referer_from_previous_request() {
    let addr = spawn_server(|req| {
        let referer = req
            .headers()
            .get("referer")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        Response::new(Body::from(referer))
    })
    .await;

    let client = specter::Client::builder().impersonate("chrome-120").build().unwrap();
    let session = specter::Session::new(client);

    let first = session
        .execute(session.get(format!("http://{addr}/p1")))
        .await
        .unwrap();
    assert_eq!(first.text().unwrap(), "");

    let second = session
        .execute(session.get(format!("http://{addr}/p2")))
        .await
        .unwrap();
    assert_eq!(second.text().unwrap(), format!("http://{addr}/p1"));
}
