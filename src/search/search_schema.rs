use crate::ids::{AlunoId, CursoId, OrigemId};
use crate::schema::CadastroPrefill;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a student record is matched against. Absent parts do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchTerm {
    pub nome: String,
    pub data_nasc: Option<NaiveDate>,
    pub origem: Option<OrigemId>,
    pub curso: Option<CursoId>,
}

/// The search form as it is posted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuscaRequest {
    pub nome: String,
    pub data_nascimento: String,
    pub origem_id: Option<OrigemId>,
    pub curso_id: Option<CursoId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resultado", rename_all = "camelCase")]
pub enum LookupOutcome {
    NaoEncontrado {
        message: String,
    },
    /// The student already has an account.
    Login {
        #[serde(rename = "alunoId")]
        aluno_id: AlunoId,
        nome: String,
    },
    /// No account yet, the registration has to be completed first.
    Cadastro { prefill: CadastroPrefill },
}
