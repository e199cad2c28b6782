use crate::ids::{AlunoId, CursoId, OrigemId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Origem {
    pub id: OrigemId,
    pub nome: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Curso {
    pub id: CursoId,
    pub nome: String,
    pub origem_id: OrigemId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Semestre {
    pub id: &'static str,
    pub nome: &'static str,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Endereco {
    pub cep: String,
    pub logradouro: String,
    pub bairro: String,
    pub cidade: String,
    pub uf: String,
}

/// A student record as the service hands it out.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aluno {
    pub id: AlunoId,
    pub nome: String,
    #[serde(with = "crate::date::iso")]
    pub data_nasc: NaiveDate,
    pub origem_id: OrigemId,
    pub curso_id: CursoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ano_formado: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semestre_formado: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ddd_contato: String,
    #[serde(default)]
    pub tel_contato: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddd_celular: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tel_celular: Option<String>,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub numero: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complemento: Option<String>,
    #[serde(default)]
    pub uf: String,
    #[serde(default)]
    pub cidade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocupacao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empresa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddd_comercial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tel_comercial: Option<String>,
}

/// Validated student data, everything but the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NovoAluno {
    pub nome: String,
    pub data_nasc: NaiveDate,
    pub origem_id: OrigemId,
    pub curso_id: CursoId,
    pub ano_formado: i32,
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

/// The registration form as it was filled in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CadastroForm {
    pub nome: String,
    pub data_nasc: String,
    pub origem_id: Option<OrigemId>,
    pub curso_id: Option<CursoId>,
    #[serde(deserialize_with = "string_or_number")]
    pub ano_formado: String,
    pub semestre_formado: Option<String>,
    pub email: String,
    pub ddd_contato: String,
    pub tel_contato: String,
    pub ddd_celular: Option<String>,
    pub tel_celular: Option<String>,
    pub cep: String,
    pub logradouro: String,
    #[serde(deserialize_with = "string_or_number")]
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telefones {
    pub contato: String,
    pub celular: String,
    pub comercial: String,
}

/// Registration form pre-filled from a stored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CadastroPrefill {
    pub aluno_id: AlunoId,
    pub form: CadastroForm,
    pub telefones: Telefones,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: UserId,
    pub aluno_id: AlunoId,
    pub nome: String,
    #[serde(with = "crate::date::iso")]
    pub data_nasc: NaiveDate,
    pub curso_id: CursoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_academico: Option<String>,
}

/// Form fields sometimes arrive as numbers (`"anoFormado": 2010`).
pub fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
        Null(()),
    }

    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n.to_string()),
        Raw::Text(s) => Ok(s),
        Raw::Null(()) => Ok(String::new()),
    }
}

/// Empty strings from the form count as absent.
pub fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
