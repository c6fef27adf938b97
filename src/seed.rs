//! Sample lessons for an empty posts collection.

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::service::{CrudService, Mode, RequestValidator};
use crate::store::{DocumentStore, Filter};
use serde_json::{json, Value};

fn sample_posts() -> Vec<Value> {
    vec![
        json!({
            "titulo": "Introdução à Matemática Básica",
            "conteudo": "Nesta aula, vamos explorar os conceitos fundamentais da matemática, incluindo operações básicas, números inteiros e frações.",
            "autor": "Prof. Maria",
            "disciplina": "Matemática",
            "tags": ["matemática", "números", "operações", "básico"]
        }),
        json!({
            "titulo": "História do Brasil Colonial",
            "conteudo": "Vamos estudar o período colonial brasileiro, desde a chegada dos portugueses até a independência.",
            "autor": "Prof. João",
            "disciplina": "História",
            "tags": ["história", "brasil", "colonial", "portugal"]
        }),
        json!({
            "titulo": "Fotossíntese e Respiração Celular",
            "conteudo": "Nesta aula, vamos entender como as plantas produzem seu próprio alimento através da fotossíntese e como todos os seres vivos obtêm energia através da respiração celular.",
            "autor": "Prof. Ana",
            "disciplina": "Biologia",
            "tags": ["biologia", "fotossíntese", "respiração", "células"]
        }),
    ]
}

/// Insert the sample posts when the collection is empty. Returns how many were inserted.
pub async fn seed_posts(store: &dyn DocumentStore, posts: &ResolvedResource) -> Result<usize, AppError> {
    if store.count(&posts.collection, &Filter::all()).await? > 0 {
        tracing::debug!(collection = %posts.collection, "collection not empty, skipping seed");
        return Ok(0);
    }
    let samples = sample_posts();
    let n = samples.len();
    for body in samples {
        let payload = RequestValidator::validate(&body, &posts.fields, Mode::Create)?;
        CrudService::create(store, posts, payload).await?;
    }
    tracing::info!(collection = %posts.collection, count = n, "seeded sample posts");
    Ok(n)
}
