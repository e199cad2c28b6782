use crate::ids::AlunoId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TipoQuestao {
    Radio,
    Textarea,
    CheckboxWithText,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpcaoResposta {
    pub id: String,
    pub texto: String,
    #[serde(default)]
    pub permite_campo_texto: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Questao {
    pub id: i64,
    pub numero: i64,
    pub texto: String,
    pub tipo: TipoQuestao,
    #[serde(default)]
    pub obrigatoria: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcoes: Option<Vec<OpcaoResposta>>,
}

impl Questao {
    pub fn opcao(&self, id: &str) -> Option<&OpcaoResposta> {
        self.opcoes.as_ref()?.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Questionario {
    pub id: String,
    pub titulo: String,
    #[serde(default)]
    pub descricao: String,
    pub questoes: Vec<Questao>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespostaMultipla {
    pub opcao_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texto_adicional: Option<String>,
}

/// One answer; which fields are set depends on the type of the question.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resposta {
    pub questao_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcao_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texto_resposta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplas: Option<Vec<RespostaMultipla>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionarioResposta {
    pub id: String,
    pub aluno_id: AlunoId,
    pub aluno_nome: String,
    pub data_preenchimento: DateTime<Utc>,
    pub respostas: Vec<Resposta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissaoRequest {
    #[serde(default)]
    pub respostas: Vec<Resposta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespostasQuery {
    pub aluno_id: Option<AlunoId>,
}
