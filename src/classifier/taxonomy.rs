//! Category taxonomy: ordered categories and their trigger phrases
//!
//! The order of categories is part of the classification contract: when two
//! categories match the same number of triggers, the one with the lower rank
//! (earlier in the list) wins. The fallback category is always last and has
//! no triggers.

use super::normalize::normalize;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Taxonomy validation errors, fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Taxonomy has no fallback category")]
    MissingFallback,

    #[error("Duplicate category key: {0}")]
    DuplicateKey(String),

    #[error("Category '{0}' has no triggers")]
    EmptyCategory(String),

    #[error("Category '{category}' has a trigger that normalizes to nothing: {trigger:?}")]
    EmptyTrigger { category: String, trigger: String },

    #[error("Failed to load taxonomy file: {0}")]
    Load(String),
}

/// Category identifier (its rank in the taxonomy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub(crate) usize);

impl CategoryId {
    pub fn rank(&self) -> usize {
        self.0
    }
}

/// A classification target
#[derive(Debug, Clone)]
pub struct Category {
    id: CategoryId,
    key: String,
    label: String,
    triggers: IndexSet<String>,
}

impl Category {
    pub fn id(&self) -> CategoryId {
        self.id
    }

    /// Priority rank, 0 being the highest priority
    pub fn rank(&self) -> usize {
        self.id.0
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Normalized trigger phrases, deduplicated
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.triggers.iter().map(String::as_str)
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.key == other.key
    }
}

impl Eq for Category {}

/// Serializable category definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// Serializable fallback definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackDef {
    pub key: String,
    pub label: String,
}

/// Serializable taxonomy definition, categories in priority order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyDef {
    #[serde(default)]
    pub categories: Vec<CategoryDef>,
    #[serde(default)]
    pub fallback: Option<FallbackDef>,
}

impl TaxonomyDef {
    /// Load a taxonomy definition from a TOML/JSON/YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        debug!("Loading taxonomy definition from {}", path.display());

        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TaxonomyError::Load(format!("{}: {}", path.display(), e)))
    }
}

/// Immutable, validated taxonomy
#[derive(Debug, Clone)]
pub struct Taxonomy {
    /// Scored categories followed by the fallback as the last entry
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Validate a definition and normalize its triggers
    pub fn from_definition(definition: TaxonomyDef) -> Result<Self, TaxonomyError> {
        let fallback = definition.fallback.ok_or(TaxonomyError::MissingFallback)?;

        let mut seen_keys = HashSet::new();
        let mut categories = Vec::with_capacity(definition.categories.len() + 1);

        for (rank, def) in definition.categories.into_iter().enumerate() {
            if !seen_keys.insert(def.key.clone()) {
                return Err(TaxonomyError::DuplicateKey(def.key));
            }

            let mut triggers = IndexSet::with_capacity(def.triggers.len());
            for raw in &def.triggers {
                let trigger = normalize(raw);
                if trigger.is_empty() {
                    return Err(TaxonomyError::EmptyTrigger {
                        category: def.key.clone(),
                        trigger: raw.clone(),
                    });
                }
                triggers.insert(trigger);
            }

            if triggers.is_empty() {
                return Err(TaxonomyError::EmptyCategory(def.key));
            }

            categories.push(Category {
                id: CategoryId(rank),
                key: def.key,
                label: def.label,
                triggers,
            });
        }

        if !seen_keys.insert(fallback.key.clone()) {
            return Err(TaxonomyError::DuplicateKey(fallback.key));
        }

        categories.push(Category {
            id: CategoryId(categories.len()),
            key: fallback.key,
            label: fallback.label,
            triggers: IndexSet::new(),
        });

        info!(
            "Taxonomy loaded: {} categories plus fallback",
            categories.len() - 1
        );

        Ok(Self { categories })
    }

    /// Load and validate a taxonomy file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        Self::from_definition(TaxonomyDef::from_file(path)?)
    }

    /// Categories that take part in scoring, in priority order
    pub fn scored(&self) -> &[Category] {
        &self.categories[..self.categories.len() - 1]
    }

    /// All categories in priority order, fallback last
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn fallback(&self) -> &Category {
        // from_definition always pushes the fallback
        &self.categories[self.categories.len() - 1]
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id.0)
    }

    pub fn by_key(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }
}

impl Default for Taxonomy {
    /// The academic-mailbox taxonomy the service ships with
    fn default() -> Self {
        Self::from_definition(builtin_definition()).expect("built-in taxonomy is valid")
    }
}

fn category(key: &str, label: &str, triggers: &[&str]) -> CategoryDef {
    CategoryDef {
        key: key.to_string(),
        label: label.to_string(),
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
    }
}

/// Built-in taxonomy definition, highest priority first
pub fn builtin_definition() -> TaxonomyDef {
    TaxonomyDef {
        categories: vec![
            category(
                "lost_and_found",
                "Achados e Perdidos",
                &[
                    "achado", "achados", "perdido", "perdidos", "achados e perdidos",
                    "objeto encontrado", "objeto perdido", "encontrado", "perdi",
                ],
            ),
            category(
                "graduating",
                "Prováveis Concluintes / Formandos",
                &[
                    "provaveis concluintes", "formando", "formandos", "colacao de grau",
                    "banco de talentos", "egresso", "egressos", "finalista",
                    "ultimo semestre", "conclusao do curso",
                ],
            ),
            category(
                "coordination_notices",
                "Avisos da Coordenação / Secretaria",
                &[
                    "coordenacao", "ccecomp", "secretaria", "comunicado", "aviso",
                    "documento", "prazo", "formulario", "calendario", "cancelamento",
                    "solicitacao", "publicacao", "eleicao", "colegiado", "coordenador",
                    "vice coordenador", "gestao", "convocacao", "comissao",
                ],
            ),
            category(
                "internships_jobs",
                "Estágio / Trainee / Oportunidades",
                &[
                    "estagio", "trainee", "vaga", "emprego", "oportunidade",
                    "recrutamento", "bolsa", "curriculo", "contratacao",
                    "processo seletivo", "empresa",
                ],
            ),
            category(
                "final_project",
                "TCC / Projeto Final",
                &[
                    "tcc", "trabalho de conclusao", "banca", "orientador",
                    "projeto final", "defesa", "monografia", "resumo", "correcao",
                    "apresentacao",
                ],
            ),
            category(
                "research_graduate",
                "Pesquisa / Iniciação Científica / Pós-Graduação",
                &[
                    "pesquisa", "pibic", "ic", "iniciacao cientifica", "laboratorio",
                    "submissao", "artigo", "paper", "publicacao", "pos graduacao",
                    "mestrado", "doutorado",
                ],
            ),
            category(
                "tutoring_scholarships",
                "Monitoria / Tutoria / Bolsas Acadêmicas",
                &[
                    "monitoria", "tutoria", "bolsa", "inscricao", "edital", "resultado",
                    "aprovado", "selecionado", "auxilio", "substituto",
                ],
            ),
            category(
                "events",
                "Eventos / Palestras / Workshops",
                &[
                    "palestra", "seminario", "evento", "oficina", "workshop", "encontro",
                    "congresso", "simposio", "mesa redonda", "live", "webinar", "feira",
                ],
            ),
            category(
                "courses",
                "Disciplinas / Professores / Aulas",
                &[
                    "aula", "professor", "disciplina", "nota", "atividade", "prova",
                    "trabalho", "avaliacao", "materiais", "cancelada", "reposicao",
                    "horario",
                ],
            ),
            category(
                "enrollment",
                "Matrícula / Ajuste de Disciplina / SEI",
                &[
                    "matricula", "ajuste", "cancelamento", "sei", "inscricao", "reajuste",
                    "trancamento", "historico", "periodo", "disciplina", "cadastro",
                ],
            ),
            category(
                "student_assistance",
                "Assistência Estudantil / Benefícios",
                &[
                    "assistencia", "bolsa", "auxilio", "moradia", "alimentacao",
                    "transporte", "beneficio", "proae", "cadastro", "socioeconomico",
                ],
            ),
        ],
        fallback: Some(FallbackDef {
            key: "other".to_string(),
            label: "Outros".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let taxonomy = Taxonomy::default();
        let labels: Vec<&str> = taxonomy.categories().iter().map(|c| c.label()).collect();

        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "Achados e Perdidos");
        assert_eq!(labels[4], "TCC / Projeto Final");
        assert_eq!(labels[8], "Disciplinas / Professores / Aulas");
        assert_eq!(labels[11], "Outros");
        assert_eq!(taxonomy.fallback().label(), "Outros");
        assert_eq!(taxonomy.fallback().rank(), 11);
        assert_eq!(taxonomy.fallback().trigger_count(), 0);
        assert_eq!(taxonomy.scored().len(), 11);
    }

    #[test]
    fn test_ranks_follow_position() {
        let taxonomy = Taxonomy::default();
        for (i, category) in taxonomy.categories().iter().enumerate() {
            assert_eq!(category.rank(), i);
            assert_eq!(taxonomy.get(category.id()), Some(category));
        }
    }

    #[test]
    fn test_missing_fallback_rejected() {
        let mut def = builtin_definition();
        def.fallback = None;
        assert!(matches!(
            Taxonomy::from_definition(def),
            Err(TaxonomyError::MissingFallback)
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut def = builtin_definition();
        def.categories.push(category("events", "Again", &["x"]));
        assert!(matches!(
            Taxonomy::from_definition(def),
            Err(TaxonomyError::DuplicateKey(k)) if k == "events"
        ));
    }

    #[test]
    fn test_fallback_key_collision_rejected() {
        let def = TaxonomyDef {
            categories: vec![category("other", "Other", &["x"])],
            fallback: Some(FallbackDef {
                key: "other".to_string(),
                label: "Outros".to_string(),
            }),
        };
        assert!(matches!(
            Taxonomy::from_definition(def),
            Err(TaxonomyError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_empty_category_rejected() {
        let def = TaxonomyDef {
            categories: vec![category("empty", "Empty", &[])],
            fallback: Some(FallbackDef {
                key: "other".to_string(),
                label: "Outros".to_string(),
            }),
        };
        assert!(matches!(
            Taxonomy::from_definition(def),
            Err(TaxonomyError::EmptyCategory(_))
        ));
    }

    #[test]
    fn test_punctuation_only_trigger_rejected() {
        let def = TaxonomyDef {
            categories: vec![category("bad", "Bad", &["ok", "!!!"])],
            fallback: Some(FallbackDef {
                key: "other".to_string(),
                label: "Outros".to_string(),
            }),
        };
        assert!(matches!(
            Taxonomy::from_definition(def),
            Err(TaxonomyError::EmptyTrigger { .. })
        ));
    }

    #[test]
    fn test_triggers_normalized_and_deduplicated() {
        let def = TaxonomyDef {
            categories: vec![category(
                "research",
                "Pesquisa",
                &["Iniciação Científica", "iniciacao cientifica", "PIBIC"],
            )],
            fallback: Some(FallbackDef {
                key: "other".to_string(),
                label: "Outros".to_string(),
            }),
        };
        let taxonomy = Taxonomy::from_definition(def).unwrap();
        let triggers: Vec<&str> = taxonomy.scored()[0].triggers().collect();
        assert_eq!(triggers, vec!["iniciacao cientifica", "pibic"]);
    }

    #[test]
    fn test_lookup_by_key() {
        let taxonomy = Taxonomy::default();
        assert_eq!(
            taxonomy.by_key("final_project").map(|c| c.label()),
            Some("TCC / Projeto Final")
        );
        assert_eq!(taxonomy.by_key("other"), Some(taxonomy.fallback()));
        assert!(taxonomy.by_key("missing").is_none());
    }
}
