//! Finding a student record and deciding where the student goes next.
pub mod search_schema;

use self::search_schema::{BuscaRequest, LookupOutcome, SearchTerm};
use crate::date;
use crate::error::{AppError, FieldErrors, RETRY_MESSAGE};
use crate::ids::AlunoId;
use crate::schema::Aluno;
use crate::students;
use log::{debug, warn};
use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str =
    "Aluno não encontrado. Verifique os dados informados e tente novamente.";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{message}: {error}")]
    InternalError { message: String, error: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        warn!("{}", e);
        AppError::Unavailable {
            message: RETRY_MESSAGE.to_string(),
        }
    }
}

impl BuscaRequest {
    /// Every field of the search form is required.
    pub fn into_term(self) -> Result<SearchTerm, AppError> {
        let mut errors = FieldErrors::new();

        if self.nome.trim().is_empty() {
            errors.add("nome", "required");
        }
        let data_nasc = if self.data_nascimento.trim().is_empty() {
            errors.add("dataNascimento", "required");
            None
        } else {
            match date::parse_birth_date(self.data_nascimento.trim()) {
                Ok(d) => Some(d),
                Err(e) => {
                    errors.add("dataNascimento", e.code());
                    None
                }
            }
        };
        if self.origem_id.is_none() {
            errors.add("origemId", "required");
        }
        if self.curso_id.is_none() {
            errors.add("cursoId", "required");
        }
        errors.into_result("Preencha os dados da busca corretamente.")?;

        Ok(SearchTerm {
            nome: self.nome,
            data_nasc,
            origem: self.origem_id,
            curso: self.curso_id,
        })
    }
}

/// Keeps the records that fit every given part of the term.
///
/// The name matches as a case insensitive substring, an empty name matches
/// everything.
pub fn match_alunos<'a>(alunos: &'a [Aluno], term: &SearchTerm) -> Vec<&'a Aluno> {
    let nome = term.nome.trim().to_lowercase();
    alunos
        .iter()
        .filter(|a| nome.is_empty() || a.nome.to_lowercase().contains(&nome))
        .filter(|a| term.origem.map_or(true, |o| a.origem_id == o))
        .filter(|a| term.curso.map_or(true, |c| a.curso_id == c))
        .filter(|a| term.data_nasc.map_or(true, |d| a.data_nasc == d))
        .collect()
}

pub fn decide(found: Option<&Aluno>, has_account: bool) -> LookupOutcome {
    match found {
        None => LookupOutcome::NaoEncontrado {
            message: NOT_FOUND_MESSAGE.to_string(),
        },
        Some(aluno) if has_account => LookupOutcome::Login {
            aluno_id: aluno.id,
            nome: aluno.nome.clone(),
        },
        Some(aluno) => LookupOutcome::Cadastro {
            prefill: students::prefill_from(aluno),
        },
    }
}

async fn account_holders(db: &SqlitePool) -> Result<HashSet<AlunoId>, AppError> {
    let ids = sqlx::query_scalar::<_, AlunoId>("SELECT aluno_id FROM usuarios")
        .fetch_all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

pub async fn lookup(db: &SqlitePool, term: &SearchTerm) -> Result<LookupOutcome, SearchError> {
    let (alunos, holders) = futures::try_join!(students::list_alunos(db), account_holders(db))
        .map_err(|e| SearchError::InternalError {
            message: "There was an error getting the alunos from the Database".to_string(),
            error: e.to_string(),
        })?;

    let found = match_alunos(&alunos, term);
    debug!("Search for {:?} matched {} alunos", term.nome, found.len());

    let first = found.first().copied();
    let has_account = first.map_or(false, |a| holders.contains(&a.id));
    Ok(decide(first, has_account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CursoId, OrigemId};
    use crate::tests::seeded_db;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;
    use chrono::NaiveDate;
    use time_test::time_test;

    fn aluno(id: i64, nome: &str, nasc: &str, origem: i64, curso: i64) -> Aluno {
        serde_json::from_value(serde_json::json!({
            "id": id, "nome": nome, "dataNasc": nasc, "origemId": origem, "cursoId": curso
        }))
        .unwrap()
    }

    fn sample() -> Vec<Aluno> {
        vec![
            aluno(1, "Maria Aparecida Souza", "1972-02-19", 1, 101),
            aluno(2, "João Pedro Almeida", "1985-07-03", 1, 102),
            aluno(3, "Maria Souza Lima", "1990-11-30", 2, 201),
        ]
    }

    #[test]
    fn empty_term_returns_everything() {
        let alunos = sample();
        assert_eq!(match_alunos(&alunos, &SearchTerm::default()).len(), 3);
    }

    #[test]
    fn unknown_name_returns_nothing() {
        let alunos = sample();
        let term = SearchTerm {
            nome: "Xavier".to_string(),
            ..Default::default()
        };
        assert!(match_alunos(&alunos, &term).is_empty());
    }

    #[test]
    fn name_is_a_case_insensitive_substring() {
        let alunos = sample();
        let term = SearchTerm {
            nome: " SOUZA ".to_string(),
            ..Default::default()
        };
        let ids: Vec<_> = match_alunos(&alunos, &term).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![AlunoId(1), AlunoId(3)]);
    }

    #[test]
    fn date_ignores_time_of_day() {
        let alunos = sample();
        let term = SearchTerm {
            nome: "maria".to_string(),
            data_nasc: Some(date::parse_birth_date("1972-02-19T23:59:00.000Z").unwrap()),
            ..Default::default()
        };
        let found = match_alunos(&alunos, &term);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, AlunoId(1));
    }

    #[test]
    fn origem_and_curso_filter() {
        let alunos = sample();
        let term = SearchTerm {
            nome: "maria".to_string(),
            origem: Some(OrigemId(2)),
            ..Default::default()
        };
        assert_eq!(match_alunos(&alunos, &term)[0].id, AlunoId(3));

        let term = SearchTerm {
            curso: Some(CursoId(102)),
            ..Default::default()
        };
        assert_eq!(match_alunos(&alunos, &term)[0].id, AlunoId(2));
    }

    #[test]
    fn matcher_over_many_records() {
        let alunos: Vec<Aluno> = (0..20_000)
            .map(|i| aluno(i, &format!("Aluno Número {}", i), "1990-01-01", 1 + i % 3, 101))
            .collect();
        let term = SearchTerm {
            nome: "número 1999".to_string(),
            data_nasc: NaiveDate::from_ymd_opt(1990, 1, 1),
            ..Default::default()
        };
        time_test!("matching 20000 alunos");
        assert_eq!(match_alunos(&alunos, &term).len(), 11);
    }

    #[test]
    fn decisions() {
        let alunos = sample();
        assert!(matches!(decide(None, false), LookupOutcome::NaoEncontrado { .. }));
        assert!(matches!(decide(Some(&alunos[0]), true), LookupOutcome::Login { .. }));
        match decide(Some(&alunos[1]), false) {
            LookupOutcome::Cadastro { prefill } => {
                assert_eq!(prefill.aluno_id, AlunoId(2));
                assert_eq!(prefill.form.data_nasc, "03/07/1985");
            }
            other => panic!("expected cadastro, got {:?}", other),
        }
    }

    #[test]
    fn busca_request_needs_every_field() {
        let err = BuscaRequest::default().into_term().unwrap_err();
        match err {
            AppError::Validation { errors, .. } => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }

        let req: BuscaRequest = serde_json::from_value(serde_json::json!({
            "nome": "maria", "dataNascimento": "19/02/1972", "origemId": "1", "cursoId": 101
        }))
        .unwrap();
        let term = req.into_term().unwrap();
        assert_eq!(term.origem, Some(OrigemId(1)));
        assert_eq!(term.data_nasc, NaiveDate::from_ymd_opt(1972, 2, 19));
    }

    #[actix_rt::test]
    async fn lookup_routes_by_account() {
        let db = seeded_db().await;
        let term = |nome: &str, nasc: (i32, u32, u32), origem: i64, curso: i64| SearchTerm {
            nome: nome.to_string(),
            data_nasc: NaiveDate::from_ymd_opt(nasc.0, nasc.1, nasc.2),
            origem: Some(OrigemId(origem)),
            curso: Some(CursoId(curso)),
        };

        let outcome = lookup(&db, &term("maria", (1972, 2, 19), 1, 101)).await.unwrap();
        assert!(matches!(outcome, LookupOutcome::Login { aluno_id: AlunoId(1), .. }));

        let outcome = lookup(&db, &term("joão", (1985, 7, 3), 1, 102)).await.unwrap();
        assert!(matches!(outcome, LookupOutcome::Cadastro { .. }));

        let outcome = lookup(&db, &term("maria", (1972, 2, 20), 1, 101)).await.unwrap();
        assert!(matches!(outcome, LookupOutcome::NaoEncontrado { .. }));
    }

    #[actix_rt::test]
    async fn failed_fetch_asks_to_retry() {
        let db = seeded_db().await;
        db.close().await;

        let err = match lookup(&db, &SearchTerm::default()).await {
            Err(e) => AppError::from(e),
            Ok(_) => panic!("lookup on a closed pool succeeded"),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], RETRY_MESSAGE);
    }
}
