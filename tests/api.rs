//! End-to-end tests over the full router with the in-memory store.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use lesson_blog::{app, builtin_config, ensure_unique_indexes, resolve, trim_trailing_slash, AppState, InMemoryStore};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> Router {
    let model = resolve(&builtin_config().unwrap()).unwrap();
    let store = InMemoryStore::new();
    ensure_unique_indexes(&store, &model).await.unwrap();
    app(AppState::new(Arc::new(store), model), 1024 * 1024)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn post_body(titulo: &str) -> Value {
    json!({
        "titulo": titulo,
        "conteudo": "Conteúdo introdutório da aula",
        "autor": "Prof. Maria",
        "disciplina": "Matemática",
        "tags": ["basico"]
    })
}

async fn create_post(app: &Router, body: Value) -> Value {
    let (status, v) = send(app, Method::POST, "/posts", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", v);
    v["dados"].clone()
}

#[tokio::test]
async fn create_then_read_round_trip() {
    let app = test_app().await;
    let (status, created) = send(&app, Method::POST, "/posts", Some(post_body("  Frações  "))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["sucesso"], true);
    assert_eq!(created["mensagem"], "Post criado com sucesso");
    let doc = &created["dados"];
    assert_eq!(doc["titulo"], "Frações");
    assert_eq!(doc["createdAt"], doc["updatedAt"]);
    assert!(doc["dataCriacao"].is_string());

    let id = doc["_id"].as_str().unwrap();
    assert_eq!(id.len(), 24);
    let (status, read) = send(&app, Method::GET, &format!("/posts/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["sucesso"], true);
    assert_eq!(&read["dados"], doc);
}

#[tokio::test]
async fn create_then_list_with_limit_one() {
    let app = test_app().await;
    create_post(&app, post_body("Aula única")).await;
    let (status, v) = send(&app, Method::GET, "/posts?limit=1&page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["dados"].as_array().unwrap().len(), 1);
    assert_eq!(
        v["paginacao"],
        json!({"paginaAtual": 1, "totalPaginas": 1, "totalPosts": 1, "postsPorPagina": 1})
    );
}

#[tokio::test]
async fn pagination_partitions_every_post() {
    let app = test_app().await;
    for i in 0..7 {
        create_post(&app, post_body(&format!("Aula {}", i))).await;
    }
    let mut ids = HashSet::new();
    let mut on_pages = 0;
    for page in 1..=3 {
        let (_, v) = send(&app, Method::GET, &format!("/posts?page={}&limit=3", page), None).await;
        assert_eq!(v["paginacao"]["totalPaginas"], 3);
        assert_eq!(v["paginacao"]["totalPosts"], 7);
        for d in v["dados"].as_array().unwrap() {
            ids.insert(d["_id"].as_str().unwrap().to_string());
            on_pages += 1;
        }
    }
    assert_eq!(on_pages, 7);
    assert_eq!(ids.len(), 7);

    let (_, beyond) = send(&app, Method::GET, "/posts?page=9&limit=3", None).await;
    assert_eq!(beyond["dados"], json!([]));
    assert_eq!(beyond["paginacao"]["paginaAtual"], 9);
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = test_app().await;
    let first = create_post(&app, post_body("Primeira")).await;
    let second = create_post(&app, post_body("Segunda")).await;
    let (_, v) = send(&app, Method::GET, "/posts", None).await;
    let ids: Vec<&str> = v["dados"].as_array().unwrap().iter().map(|d| d["_id"].as_str().unwrap()).collect();
    assert_eq!(ids, [second["_id"].as_str().unwrap(), first["_id"].as_str().unwrap()]);
}

#[tokio::test]
async fn list_filters_by_substring() {
    let app = test_app().await;
    create_post(&app, post_body("Aula A")).await;
    let mut other = post_body("Aula B");
    other["autor"] = json!("Prof. João");
    other["disciplina"] = json!("História");
    create_post(&app, other).await;

    let (_, v) = send(&app, Method::GET, "/posts?autor=jo%C3%A3o", None).await;
    assert_eq!(v["paginacao"]["totalPosts"], 1);
    assert_eq!(v["dados"][0]["titulo"], "Aula B");

    let (_, v) = send(&app, Method::GET, "/posts?autor=prof&disciplina=mat", None).await;
    assert_eq!(v["paginacao"]["totalPosts"], 1);
    assert_eq!(v["dados"][0]["titulo"], "Aula A");

    let (_, v) = send(&app, Method::GET, "/posts?autor=.*", None).await;
    assert_eq!(v["paginacao"]["totalPosts"], 0);
}

#[tokio::test]
async fn search_matches_title_and_tags() {
    let app = test_app().await;
    let mut math = post_body("Mathematics Basics");
    math["tags"] = json!([]);
    create_post(&app, math).await;
    let mut tagged = post_body("Geometria");
    tagged["tags"] = json!(["math"]);
    create_post(&app, tagged).await;
    let mut history = post_body("História");
    history["conteudo"] = json!("Período colonial brasileiro");
    history["disciplina"] = json!("História");
    history["tags"] = json!(["colonial"]);
    create_post(&app, history).await;

    let (status, v) = send(&app, Method::GET, "/posts/search?q=Math", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["termoBusca"], "Math");
    assert_eq!(v["paginacao"]["totalPosts"], 2);
    let titles: HashSet<&str> = v["dados"].as_array().unwrap().iter().map(|d| d["titulo"].as_str().unwrap()).collect();
    assert_eq!(titles, HashSet::from(["Mathematics Basics", "Geometria"]));
}

#[tokio::test]
async fn search_rejects_missing_or_short_terms() {
    let app = test_app().await;
    let (status, v) = send(&app, Method::GET, "/posts/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["mensagem"], "Parâmetro de busca (q) é obrigatório");

    let (status, v) = send(&app, Method::GET, "/posts/search?q=%20a%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["mensagem"], "Termo de busca deve ter pelo menos 2 caracteres");

    let (status, v) = send(&app, Method::GET, "/alunos/search?q=ana", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["mensagem"], "Endpoint não encontrado");
}

#[tokio::test]
async fn validation_errors_are_collected() {
    let app = test_app().await;
    let (status, v) = send(&app, Method::POST, "/posts", Some(json!({"titulo": "ab"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["sucesso"], false);
    assert_eq!(v["mensagem"], "Dados inválidos");
    assert_eq!(
        v["erros"],
        json!([
            "Título deve ter pelo menos 3 caracteres",
            "Conteúdo é obrigatório",
            "Autor é obrigatório"
        ])
    );
}

#[tokio::test]
async fn malformed_json_is_invalid_data() {
    let app = test_app().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/alunos")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["mensagem"], "Dados inválidos");
    assert_eq!(v["erros"], json!(["O corpo da requisição não é um JSON válido"]));
}

#[tokio::test]
async fn missing_content_type_is_invalid_data() {
    let app = test_app().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/alunos")
        .body(Body::from(json!({"nome": "Ana", "email": "ana@escola.com"}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["erros"], json!(["O cabeçalho Content-Type deve ser application/json"]));
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = test_app().await;
    let created = create_post(&app, post_body("Original")).await;
    let id = created["_id"].as_str().unwrap();

    let (status, v) = send(&app, Method::PUT, &format!("/posts/{}", id), Some(json!({"titulo": "Revisada"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["mensagem"], "Post atualizado com sucesso");
    assert_eq!(v["dados"]["titulo"], "Revisada");
    assert_eq!(v["dados"]["conteudo"], created["conteudo"]);
    assert_eq!(v["dados"]["tags"], created["tags"]);
    assert_eq!(v["dados"]["dataCriacao"], created["dataCriacao"]);

    let (status, v) = send(&app, Method::PUT, &format!("/posts/{}", id), Some(json!({"autor": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["erros"], json!(["Autor é obrigatório"]));
}

#[tokio::test]
async fn delete_then_not_found() {
    let app = test_app().await;
    let created = create_post(&app, post_body("Temporária")).await;
    let uri = format!("/posts/{}", created["_id"].as_str().unwrap());

    let (status, v) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["mensagem"], "Post removido com sucesso");
    assert_eq!(v["dados"]["_id"], created["_id"]);

    let (status, v) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["mensagem"], "Post não encontrado");

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let app = test_app().await;
    for (method, body) in [
        (Method::GET, None),
        (Method::PUT, Some(json!({"nome": "Ana"}))),
        (Method::DELETE, None),
    ] {
        let (status, v) = send(&app, method, "/alunos/123", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["mensagem"], "ID inválido");
    }
}

#[tokio::test]
async fn email_uniqueness_is_per_resource() {
    let app = test_app().await;
    let body = json!({"nome": "Ana Souza", "email": "Ana@Escola.com"});

    let (status, v) = send(&app, Method::POST, "/professores", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v["mensagem"], "Professor criado com sucesso!");
    assert_eq!(v["dados"]["email"], "ana@escola.com");

    let (status, v) = send(&app, Method::POST, "/professores", Some(json!({"nome": "Outra", "email": "ANA@escola.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["mensagem"], "Já existe um professor cadastrado com este email");

    let (status, v) = send(&app, Method::POST, "/alunos", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v["mensagem"], "Aluno criado com sucesso!");
}

#[tokio::test]
async fn update_to_taken_email_conflicts() {
    let app = test_app().await;
    let (_, a) = send(&app, Method::POST, "/alunos", Some(json!({"nome": "Ana", "email": "a@x.com"}))).await;
    send(&app, Method::POST, "/alunos", Some(json!({"nome": "Bia", "email": "b@x.com"}))).await;
    let uri = format!("/alunos/{}", a["dados"]["_id"].as_str().unwrap());

    let (status, v) = send(&app, Method::PUT, &uri, Some(json!({"email": "B@x.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["mensagem"], "Já existe um aluno cadastrado com este email");

    let (status, v) = send(&app, Method::PUT, &uri, Some(json!({"turma": "3A"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["mensagem"], "Aluno atualizado com sucesso!");
    assert_eq!(v["dados"]["email"], "a@x.com");
}

#[tokio::test]
async fn professor_list_uses_its_pagination_keys() {
    let app = test_app().await;
    send(&app, Method::POST, "/professores", Some(json!({"nome": "Carlos", "email": "c@x.com", "disciplina": "Física"}))).await;
    let (_, v) = send(&app, Method::GET, "/professores?disciplina=SICA", None).await;
    assert_eq!(
        v["paginacao"],
        json!({"paginaAtual": 1, "totalPaginas": 1, "totalProfessores": 1, "professoresPorPagina": 1})
    );
}

#[tokio::test]
async fn unknown_endpoints_are_404() {
    let app = test_app().await;
    let (status, v) = send(&app, Method::GET, "/cursos", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v, json!({"sucesso": false, "mensagem": "Endpoint não encontrado", "endpoint": "/cursos"}));

    let (status, v) = send(&app, Method::GET, "/a/b/c", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["endpoint"], "/a/b/c");
}

#[tokio::test]
async fn health_reports_service_up() {
    let app = test_app().await;
    let (status, v) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["sucesso"], true);
    assert_eq!(v["mensagem"], "API do Blog de Aulas está funcionando!");
    assert!(v["timestamp"].is_string());
    assert_eq!(v["versao"], "1.0.0");

    let (status, v) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["database"], "ok");
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let app = test_app().await;
    let big = json!({"titulo": "x".repeat(2 * 1024 * 1024)}).to_string();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/posts")
        .header("content-type", "application/json")
        .header("content-length", big.len())
        .body(Body::from(big))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn trailing_slash_reaches_the_same_route() {
    let app = test_app().await;
    create_post(&app, post_body("Barra final")).await;

    let req = Request::builder().uri("/posts/").body(Body::empty()).unwrap();
    let resp = trim_trailing_slash(app).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["dados"][0]["titulo"], "Barra final");
}
