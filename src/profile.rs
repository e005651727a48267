//! Deployment profiles: the synonym dictionary and target schema a run uses.
//!
//! Profiles are compiled in and immutable. They are handed to
//! [`crate::pipeline::process`] explicitly so several profiles can coexist in
//! one process (and in tests).

use serde::Serialize;

use crate::text::normalize;

pub const DOCUMENT_FIELD: &str = "cpf";
pub const PERSON_TYPE_FIELD: &str = "tipo_pessoa";
pub const LEGAL_NAME_FIELD: &str = "razao_social";
pub const TRADE_NAME_FIELD: &str = "fantasia";
pub const STATE_FIELD: &str = "uf";
pub const FIRST_NAME_FIELD: &str = "primeiro_nome";
pub const LAST_NAME_FIELD: &str = "sobrenome";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSynonyms {
    pub field: String,
    /// Matched anywhere inside the normalized header.
    pub synonyms: Vec<String>,
    /// Matched only against the whole normalized header. Short tokens such as
    /// `rg` or `obs` live here so they do not fire inside `Cargo` or `Jobs`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub whole_headers: Vec<String>,
}

impl FieldSynonyms {
    /// Returns the synonym recognising `normalized_header`, whole-header ones first.
    pub fn matching(&self, normalized_header: &str) -> Option<&str> {
        self.whole_headers
            .iter()
            .map(String::as_str)
            .find(|synonym| *synonym == normalized_header)
            .or_else(|| crate::resolve::matching_synonym(normalized_header, &self.synonyms))
    }
}

/// Canonical field names mapped to the header substrings that identify them.
///
/// Field order is the resolution order; synonym order inside a field has no
/// effect on which header wins (headers are scanned in source order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynonymDictionary {
    entries: Vec<FieldSynonyms>,
}

impl SynonymDictionary {
    /// Builds a dictionary, storing every synonym in normalized form.
    pub fn new<I, F, S, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (F, S)>,
        F: Into<String>,
        S: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(field, synonyms)| FieldSynonyms {
                field: field.into(),
                synonyms: normalized_synonyms(synonyms),
                whole_headers: Vec::new(),
            })
            .collect();
        Self { entries }
    }

    /// Adds synonyms that only match a header equal to them after normalization.
    /// Fields not already in the dictionary are ignored.
    pub fn with_whole_headers<I, F, S, T>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, S)>,
        F: AsRef<str>,
        S: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for (field, synonyms) in entries {
            if let Some(entry) = self
                .entries
                .iter_mut()
                .find(|entry| entry.field == field.as_ref())
            {
                entry.whole_headers.extend(normalized_synonyms(synonyms));
            }
        }
        self
    }

    pub fn entry(&self, field: &str) -> Option<&FieldSynonyms> {
        self.entries.iter().find(|entry| entry.field == field)
    }

    pub fn entries(&self) -> &[FieldSynonyms] {
        &self.entries
    }

    pub fn synonyms_for(&self, field: &str) -> Option<&[String]> {
        self.entry(field).map(|entry| entry.synonyms.as_slice())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.synonyms_for(field).is_some()
    }
}

fn normalized_synonyms<S, T>(synonyms: S) -> Vec<String>
where
    S: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    synonyms
        .into_iter()
        .map(|synonym| normalize(synonym.as_ref()))
        .filter(|synonym| !synonym.is_empty())
        .collect()
}

/// Fields the pipeline treats specially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRoles {
    pub document: String,
    pub person_type: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub state: Option<String>,
    /// Source-only fields feeding the name reconstructor; never part of the output.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Default for FieldRoles {
    fn default() -> Self {
        Self {
            document: DOCUMENT_FIELD.to_string(),
            person_type: PERSON_TYPE_FIELD.to_string(),
            legal_name: LEGAL_NAME_FIELD.to_string(),
            trade_name: Some(TRADE_NAME_FIELD.to_string()),
            state: Some(STATE_FIELD.to_string()),
            first_name: Some(FIRST_NAME_FIELD.to_string()),
            last_name: Some(LAST_NAME_FIELD.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSchema {
    fields: Vec<String>,
    roles: FieldRoles,
}

impl TargetSchema {
    pub fn new<I, S>(fields: I, roles: FieldRoles) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            roles,
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn roles(&self) -> &FieldRoles {
        &self.roles
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|candidate| candidate == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Checks that every output role names a schema field and that fields are unique.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("document", Some(&self.roles.document)),
            ("person type", Some(&self.roles.person_type)),
            ("legal name", Some(&self.roles.legal_name)),
            ("trade name", self.roles.trade_name.as_ref()),
            ("state", self.roles.state.as_ref()),
        ];
        for (role, field) in required {
            if let Some(field) = field
                && !self.contains(field)
            {
                return Err(format!(
                    "{role} field '{field}' is not part of the target schema"
                ));
            }
        }
        for (idx, field) in self.fields.iter().enumerate() {
            if self.fields[..idx].contains(field) {
                return Err(format!("field '{field}' is declared more than once"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: &'static str,
    pub description: &'static str,
    pub synonyms: SynonymDictionary,
    pub schema: TargetSchema,
}

pub fn all() -> Vec<Profile> {
    vec![standard(), extended()]
}

/// Resolved ahead of the legal name so an exclusive run leaves name fragments
/// to their own fields.
const NAME_SYNONYMS: &[(&str, &[&str])] = &[
    (FIRST_NAME_FIELD, &["primeiro nome", "prenome", "first name"]),
    (LAST_NAME_FIELD, &["sobrenome", "ultimo nome", "last name"]),
];

const STANDARD_SYNONYMS: &[(&str, &[&str])] = &[
    (LEGAL_NAME_FIELD, &["nome", "razao social", "cliente", "empresa"]),
    (TRADE_NAME_FIELD, &["fantasia", "nome fantasia"]),
    (DOCUMENT_FIELD, &["cpf", "documento", "cnpj", "cpf/cnpj"]),
    ("email", &["email", "e-mail"]),
    ("celular", &["celular", "whatsapp", "telefone", "telefone celular"]),
    ("cep", &["cep", "código postal"]),
    ("endereco", &["endereco", "logradouro", "rua"]),
    ("numero", &["numero", "número", "num"]),
    ("bairro", &["bairro", "distrito"]),
    ("cidade", &["cidade", "município", "municipio"]),
    (STATE_FIELD, &["uf", "estado", "unidade federativa"]),
];

const STANDARD_FIELDS: &[&str] = &[
    "codigo",
    LEGAL_NAME_FIELD,
    TRADE_NAME_FIELD,
    DOCUMENT_FIELD,
    PERSON_TYPE_FIELD,
    "email",
    "celular",
    "cep",
    "endereco",
    "numero",
    "complemento",
    "bairro",
    "cidade",
    STATE_FIELD,
    "observacoes",
];

/// The 15-column layout used by the import spreadsheet.
pub fn standard() -> Profile {
    Profile {
        name: "standard",
        description: "Cadastro básico de clientes (15 colunas)",
        synonyms: SynonymDictionary::new(
            NAME_SYNONYMS
                .iter()
                .chain(STANDARD_SYNONYMS)
                .map(|(field, synonyms)| (*field, synonyms.iter())),
        ),
        schema: TargetSchema::new(STANDARD_FIELDS.iter().copied(), FieldRoles::default()),
    }
}

const EXTENDED_SYNONYMS: &[(&str, &[&str])] = &[
    ("codigo", &["codigo cliente", "cod cliente", "id cliente", "matricula"]),
    (
        LEGAL_NAME_FIELD,
        &["razao social", "nome cliente", "nome completo", "nome", "empresa"],
    ),
    (TRADE_NAME_FIELD, &["fantasia", "nome fantasia"]),
    (DOCUMENT_FIELD, &["cpf", "documento", "cnpj", "cpf/cnpj"]),
    ("rg", &["identidade", "registro geral", "numero rg", "num rg"]),
    ("inscricao_estadual", &["inscricao estadual", "insc estadual", "insc. estadual"]),
    ("inscricao_municipal", &["inscricao municipal", "insc municipal", "insc. municipal"]),
    ("data_nascimento", &["nascimento", "data nasc", "aniversario"]),
    ("sexo", &["sexo", "genero"]),
    ("email", &["email", "e-mail"]),
    ("site", &["site", "homepage"]),
    (
        "telefone",
        &["telefone fixo", "telefone residencial", "telefone comercial", "fone fixo"],
    ),
    ("celular", &["celular", "whatsapp", "telefone celular"]),
    ("contato", &["contato", "responsavel"]),
    ("cep", &["cep", "código postal"]),
    ("endereco", &["endereco", "logradouro", "rua"]),
    ("numero", &["numero do endereco", "numero endereco", "numero residencia"]),
    ("complemento", &["complemento"]),
    ("bairro", &["bairro", "distrito"]),
    ("cidade", &["cidade", "município", "municipio"]),
    (STATE_FIELD, &["estado", "unidade federativa"]),
    ("pais", &["pais", "country"]),
    ("observacoes", &["observ", "anotac", "comentario"]),
];

/// Short or generic names that only count when they are the entire header.
const EXTENDED_WHOLE_HEADERS: &[(&str, &[&str])] = &[
    ("codigo", &["codigo", "cod", "id"]),
    (LEGAL_NAME_FIELD, &["cliente"]),
    ("rg", &["rg"]),
    ("telefone", &["telefone", "fone", "tel"]),
    ("numero", &["numero", "num", "num.", "no"]),
    ("complemento", &["compl", "compl."]),
    (STATE_FIELD, &["uf"]),
    ("observacoes", &["obs", "obs."]),
];

const EXTENDED_FIELDS: &[&str] = &[
    "codigo",
    LEGAL_NAME_FIELD,
    TRADE_NAME_FIELD,
    DOCUMENT_FIELD,
    PERSON_TYPE_FIELD,
    "rg",
    "inscricao_estadual",
    "inscricao_municipal",
    "data_nascimento",
    "sexo",
    "email",
    "site",
    "telefone",
    "celular",
    "contato",
    "cep",
    "endereco",
    "numero",
    "complemento",
    "bairro",
    "cidade",
    STATE_FIELD,
    "pais",
    "observacoes",
];

/// Full registration layout with identification, contact and address details.
pub fn extended() -> Profile {
    Profile {
        name: "extended",
        description: "Cadastro completo com documentos, contatos e endereço (24 colunas)",
        synonyms: SynonymDictionary::new(
            NAME_SYNONYMS
                .iter()
                .chain(EXTENDED_SYNONYMS)
                .map(|(field, synonyms)| (*field, synonyms.iter())),
        )
        .with_whole_headers(
            EXTENDED_WHOLE_HEADERS
                .iter()
                .map(|(field, synonyms)| (*field, synonyms.iter())),
        ),
        schema: TargetSchema::new(EXTENDED_FIELDS.iter().copied(), FieldRoles::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        for profile in all() {
            profile
                .schema
                .validate()
                .unwrap_or_else(|err| panic!("profile {}: {err}", profile.name));
            assert!(profile.synonyms.contains(DOCUMENT_FIELD));
        }
        assert_eq!(standard().schema.fields().len(), 15);
        assert_eq!(extended().schema.fields().len(), 24);
    }

    #[test]
    fn synonyms_are_stored_normalized() {
        let profile = standard();
        let cep = profile.synonyms.synonyms_for("cep").expect("cep synonyms");
        assert!(cep.contains(&"codigo postal".to_string()));
        let cidade = profile.synonyms.synonyms_for("cidade").expect("cidade");
        assert!(cidade.contains(&"municipio".to_string()));
    }

    #[test]
    fn whole_header_synonyms_match_only_the_entire_header() {
        let dictionary = SynonymDictionary::new([("rg", ["identidade"])])
            .with_whole_headers([("rg", ["RG"]), ("unknown", ["x"])]);
        let entry = dictionary.entry("rg").expect("rg entry");
        assert_eq!(entry.whole_headers, vec!["rg".to_string()]);
        assert_eq!(entry.matching("rg"), Some("rg"));
        assert_eq!(entry.matching("cargo"), None);
        assert_eq!(entry.matching("carteira de identidade"), Some("identidade"));
        assert!(!dictionary.contains("unknown"));
    }

    #[test]
    fn name_fragments_resolve_before_the_legal_name() {
        for profile in all() {
            let fields = profile
                .synonyms
                .entries()
                .iter()
                .map(|entry| entry.field.as_str())
                .collect::<Vec<_>>();
            assert_eq!(&fields[..2], &[FIRST_NAME_FIELD, LAST_NAME_FIELD]);
        }
    }

    #[test]
    fn validate_rejects_missing_role_field() {
        let schema = TargetSchema::new(["razao_social", "tipo_pessoa"], FieldRoles::default());
        let err = schema.validate().expect_err("document role missing");
        assert!(err.contains("cpf"));
    }
}
