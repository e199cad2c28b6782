//! Rows as they come out of the database.
use crate::ids::{AlunoId, CursoId, OrigemId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Aluno {
    pub id: AlunoId,
    pub nome: String,
    pub data_nasc: String,
    pub origem_id: OrigemId,
    pub curso_id: CursoId,
    pub ano_formado: Option<i64>,
    pub semestre_formado: Option<String>,
    pub email: String,
    pub ddd_contato: String,
    pub tel_contato: String,
    pub ddd_celular: Option<String>,
    pub tel_celular: Option<String>,
    pub cep: String,
    pub logradouro: String,
    pub numero: String,
    pub bairro: String,
    pub complemento: Option<String>,
    pub uf: String,
    pub cidade: String,
    pub ocupacao: Option<String>,
    pub empresa: Option<String>,
    pub ddd_comercial: Option<String>,
    pub tel_comercial: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Usuario {
    pub id: UserId,
    pub aluno_id: AlunoId,
    pub nome: String,
    pub data_nasc: String,
    pub curso_id: CursoId,
    pub numero_academico: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Questionario {
    pub id: String,
    pub titulo: String,
    pub descricao: String,
    pub questoes: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct QuestionarioResposta {
    pub id: String,
    pub aluno_id: AlunoId,
    pub aluno_nome: String,
    pub data_preenchimento: String,
    pub respostas: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserSession {
    pub api_key: String,
    pub user_id: UserId,
    pub aluno_id: AlunoId,
    pub nome: String,
    pub time_of_creation: i64,
    pub last_refresh: i64,
}
