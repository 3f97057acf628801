use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::ResolvedRow;

/// Fixed "create scheduled debit" endpoint of the accounting API.
pub const DEBIT_ENDPOINT: &str = "https://api.nibo.com.br/empresas/v1/schedules/debit";

const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// One request descriptor per document in a single collection.
    #[default]
    Batch,
    /// One template request plus a data file for the collection runner.
    Runner,
    /// One standalone file per document plus a manifest.
    Discrete,
}

impl ExportMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "batch" => Some(Self::Batch),
            "runner" => Some(Self::Runner),
            "discrete" => Some(Self::Discrete),
            _ => None,
        }
    }
}

/// Run-constant configuration applied to every exported document.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub collection_name: String,
    pub api_token: String,
    pub category_id: String,
    pub description: String,
    pub reference: String,
    pub schedule_date: NaiveDate,
    pub due_date: NaiveDate,
    pub accrual_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySplit {
    pub category_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCenterSplit {
    pub cost_center_id: String,
    pub value: f64,
}

/// The request body for the scheduled-debit endpoint, one per valid row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub stakeholder_id: String,
    pub description: String,
    pub reference: String,
    pub schedule_date: String,
    pub due_date: String,
    pub accrual_date: String,
    pub categories: Vec<CategorySplit>,
    pub cost_center_value_type: i32,
    pub cost_centers: Vec<CostCenterSplit>,
}

impl ExportDocument {
    /// Absent strings become "", absent values 0.0; a valid row never
    /// exercises those defaults but the builder stays total.
    pub fn from_row(row: &ResolvedRow, config: &ExportConfig) -> Self {
        ExportDocument {
            stakeholder_id: row.stakeholder_id.clone().unwrap_or_default(),
            description: config.description.clone(),
            reference: config.reference.clone(),
            schedule_date: config.schedule_date.format("%Y-%m-%d").to_string(),
            due_date: config.due_date.format("%Y-%m-%d").to_string(),
            accrual_date: config.accrual_date.format("%Y-%m-%d").to_string(),
            categories: vec![CategorySplit {
                category_id: config.category_id.clone(),
                value: row.row.amount,
            }],
            cost_center_value_type: 0,
            cost_centers: vec![CostCenterSplit {
                cost_center_id: row.cost_center_id.clone().unwrap_or_default(),
                value: row.row.amount,
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Collection wrapper (importable API-client format, v2.1.0)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub info: CollectionInfo,
    pub item: Vec<CollectionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(rename = "_postman_id")]
    pub postman_id: String,
    pub schema: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Vec<ItemEvent>>,
    pub request: RequestDescriptor,
    pub response: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEvent {
    pub listen: String,
    pub script: EventScript,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventScript {
    pub exec: Vec<String>,
    #[serde(rename = "type")]
    pub script_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub header: Vec<HeaderEntry>,
    pub url: UrlDescriptor,
    pub body: RequestBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlDescriptor {
    pub raw: String,
    pub protocol: String,
    pub host: Vec<String>,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub mode: String,
    pub raw: String,
}

/// One row of the runner side-table; `request_data` carries the whole
/// serialized document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerRow {
    #[serde(rename = "requestData")]
    pub request_data: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct NamedDocument {
    pub file_name: String,
    pub document: ExportDocument,
}

#[derive(Debug)]
pub enum ExportOutput {
    Batch {
        collection: Collection,
    },
    Runner {
        collection: Collection,
        data_rows: Vec<RunnerRow>,
    },
    Discrete {
        documents: Vec<NamedDocument>,
        manifest: Vec<ManifestEntry>,
    },
}

impl ExportOutput {
    pub fn document_count(&self) -> usize {
        match self {
            Self::Batch { collection } => collection.item.len(),
            Self::Runner { data_rows, .. } => data_rows.len(),
            Self::Discrete { documents, .. } => documents.len(),
        }
    }
}

/// Build the export for the chosen mode from the valid row set.
pub fn build_export(
    rows: &[ResolvedRow],
    config: &ExportConfig,
    mode: ExportMode,
) -> Result<ExportOutput> {
    let documents: Vec<ExportDocument> = rows
        .iter()
        .map(|row| ExportDocument::from_row(row, config))
        .collect();
    match mode {
        ExportMode::Batch => Ok(ExportOutput::Batch {
            collection: build_batch(&documents, config)?,
        }),
        ExportMode::Runner => {
            let (collection, data_rows) = build_runner(&documents, config)?;
            Ok(ExportOutput::Runner {
                collection,
                data_rows,
            })
        }
        ExportMode::Discrete => {
            let (documents, manifest) = build_discrete(documents);
            Ok(ExportOutput::Discrete {
                documents,
                manifest,
            })
        }
    }
}

fn collection_info(name: &str, description: &str) -> CollectionInfo {
    CollectionInfo {
        name: name.to_string(),
        postman_id: Uuid::new_v4().to_string(),
        schema: COLLECTION_SCHEMA.to_string(),
        description: description.to_string(),
    }
}

fn debit_url() -> UrlDescriptor {
    UrlDescriptor {
        raw: DEBIT_ENDPOINT.to_string(),
        protocol: "https".to_string(),
        host: ["api", "nibo", "com", "br"].iter().map(|s| s.to_string()).collect(),
        path: ["empresas", "v1", "schedules", "debit"].iter().map(|s| s.to_string()).collect(),
    }
}

fn debit_request(token: &str, body: String) -> RequestDescriptor {
    RequestDescriptor {
        method: "POST".to_string(),
        header: vec![
            HeaderEntry {
                key: "Content-Type".to_string(),
                value: "application/json".to_string(),
            },
            HeaderEntry {
                key: "ApiToken".to_string(),
                value: token.to_string(),
            },
        ],
        url: debit_url(),
        body: RequestBody {
            mode: "raw".to_string(),
            raw: body,
        },
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn item_name(index: usize, description: &str) -> String {
    let ellipsis = if description.chars().count() > 50 { "..." } else { "" };
    format!(
        "Agendamento {} - {}{}",
        index + 1,
        truncate_chars(description, 50),
        ellipsis
    )
}

fn build_batch(documents: &[ExportDocument], config: &ExportConfig) -> Result<Collection> {
    let mut items = Vec::with_capacity(documents.len());
    for (i, document) in documents.iter().enumerate() {
        let body = serde_json::to_string_pretty(document)?;
        items.push(CollectionItem {
            name: item_name(i, &document.description),
            event: None,
            request: debit_request(&config.api_token, body),
            response: Vec::new(),
        });
    }
    Ok(Collection {
        info: collection_info(
            &config.collection_name,
            "Coleção gerada automaticamente pelo nibo-batch",
        ),
        item: items,
    })
}

const RUNNER_PRE_REQUEST: &[&str] = &[
    "// Script para carregar dados dinamicamente no Collection Runner",
    "const requestData = pm.iterationData.get(\"requestData\");",
    "",
    "if (requestData) {",
    "    pm.request.body.raw = requestData;",
    "    console.log(\"Enviando dados:\", JSON.parse(requestData).description);",
    "}",
];

fn build_runner(
    documents: &[ExportDocument],
    config: &ExportConfig,
) -> Result<(Collection, Vec<RunnerRow>)> {
    let mut data_rows = Vec::with_capacity(documents.len());
    for document in documents {
        data_rows.push(RunnerRow {
            request_data: serde_json::to_string(document)?,
            description: document.description.clone(),
        });
    }
    let template = CollectionItem {
        name: "Criar Agendamento Nibo".to_string(),
        event: Some(vec![ItemEvent {
            listen: "prerequest".to_string(),
            script: EventScript {
                exec: RUNNER_PRE_REQUEST.iter().map(|s| s.to_string()).collect(),
                script_type: "text/javascript".to_string(),
            },
        }]),
        request: debit_request(
            &config.api_token,
            "// Este body será substituído pelo Pre-request Script".to_string(),
        ),
        response: Vec::new(),
    };
    let collection = Collection {
        info: collection_info(
            &format!("{} - Collection Runner", config.collection_name),
            "Coleção otimizada para Collection Runner",
        ),
        item: vec![template],
    };
    Ok((collection, data_rows))
}

/// Keep only characters that are safe in a file name.
pub fn sanitize_description(description: &str) -> String {
    description
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn document_file_name(index: usize, description: &str) -> String {
    let prefix = truncate_chars(&sanitize_description(description), 30);
    format!("agendamento_{:03}_{}.json", index + 1, prefix.trim_end())
}

fn build_discrete(documents: Vec<ExportDocument>) -> (Vec<NamedDocument>, Vec<ManifestEntry>) {
    let mut named = Vec::with_capacity(documents.len());
    let mut manifest = Vec::with_capacity(documents.len());
    for (i, document) in documents.into_iter().enumerate() {
        let file_name = document_file_name(i, &document.description);
        manifest.push(ManifestEntry {
            file: file_name.clone(),
        });
        named.push(NamedDocument {
            file_name,
            document,
        });
    }
    (named, manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CleanRow;

    fn config() -> ExportConfig {
        ExportConfig {
            collection_name: "Nibo Agendamentos".to_string(),
            api_token: "tok-123".to_string(),
            category_id: "cat-1".to_string(),
            description: "Benefício processado automaticamente".to_string(),
            reference: "PROC".to_string(),
            schedule_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            accrual_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        }
    }

    fn valid_row(index: usize, amount: f64) -> ResolvedRow {
        ResolvedRow {
            row: CleanRow {
                row_index: index,
                employee_id: 1234,
                cost_center_code: 5,
                amount,
                already_processed: false,
            },
            stakeholder_id: Some("abc".to_string()),
            cost_center_id: Some("xyz".to_string()),
        }
    }

    #[test]
    fn test_document_shape() {
        let doc = ExportDocument::from_row(&valid_row(0, 100.50), &config());
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["stakeholderId"], "abc");
        assert_eq!(value["scheduleDate"], "2026-08-01");
        assert_eq!(value["dueDate"], "2026-08-10");
        assert_eq!(value["accrualDate"], "2026-08-01");
        assert_eq!(value["costCenterValueType"], 0);
        assert_eq!(value["categories"][0]["categoryId"], "cat-1");
        assert_eq!(value["categories"][0]["value"], 100.50);
        assert_eq!(value["costCenters"][0]["costCenterId"], "xyz");
        assert_eq!(value["costCenters"][0]["value"], 100.50);
    }

    #[test]
    fn test_document_defaults_for_absent_fields() {
        let mut row = valid_row(0, 10.0);
        row.stakeholder_id = None;
        row.cost_center_id = None;
        let doc = ExportDocument::from_row(&row, &config());
        assert_eq!(doc.stakeholder_id, "");
        assert_eq!(doc.cost_centers[0].cost_center_id, "");
    }

    #[test]
    fn test_batch_collection() {
        let rows: Vec<ResolvedRow> = (0..3).map(|i| valid_row(i, 10.0)).collect();
        let output = build_export(&rows, &config(), ExportMode::Batch).unwrap();
        let ExportOutput::Batch { collection } = output else {
            panic!("expected batch output");
        };
        assert_eq!(collection.item.len(), 3);
        assert_eq!(collection.info.name, "Nibo Agendamentos");
        assert!(collection.info.schema.contains("v2.1.0"));
        let item = &collection.item[0];
        assert!(item.name.starts_with("Agendamento 1 - "));
        assert_eq!(item.request.method, "POST");
        assert_eq!(item.request.url.raw, DEBIT_ENDPOINT);
        assert_eq!(item.request.header[1].key, "ApiToken");
        assert_eq!(item.request.header[1].value, "tok-123");
        // the raw body re-parses into the document it was built from
        let body: ExportDocument = serde_json::from_str(&item.request.body.raw).unwrap();
        assert_eq!(body.stakeholder_id, "abc");
    }

    #[test]
    fn test_item_name_truncates_long_descriptions() {
        let long = "x".repeat(60);
        let name = item_name(0, &long);
        assert!(name.ends_with("..."));
        assert!(name.contains(&"x".repeat(50)));
        assert!(!name.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_runner_collection() {
        let rows: Vec<ResolvedRow> = (0..4).map(|i| valid_row(i, 10.0)).collect();
        let output = build_export(&rows, &config(), ExportMode::Runner).unwrap();
        let ExportOutput::Runner {
            collection,
            data_rows,
        } = output
        else {
            panic!("expected runner output");
        };
        assert_eq!(collection.item.len(), 1);
        assert_eq!(data_rows.len(), 4);
        assert!(collection.info.name.ends_with("- Collection Runner"));
        let events = collection.item[0].event.as_ref().unwrap();
        assert_eq!(events[0].listen, "prerequest");
        assert!(events[0].script.exec.iter().any(|l| l.contains("requestData")));
        let doc: ExportDocument = serde_json::from_str(&data_rows[0].request_data).unwrap();
        assert_eq!(doc.cost_centers[0].cost_center_id, "xyz");
    }

    #[test]
    fn test_discrete_documents_round_trip() {
        let rows: Vec<ResolvedRow> = (0..2).map(|i| valid_row(i, 55.5)).collect();
        let output = build_export(&rows, &config(), ExportMode::Discrete).unwrap();
        let ExportOutput::Discrete {
            documents,
            manifest,
        } = output
        else {
            panic!("expected discrete output");
        };
        assert_eq!(documents.len(), 2);
        assert_eq!(manifest.len(), 2);
        for (named, entry) in documents.iter().zip(&manifest) {
            assert_eq!(named.file_name, entry.file);
            let json = serde_json::to_string(&named.document).unwrap();
            let back: ExportDocument = serde_json::from_str(&json).unwrap();
            assert_eq!(back, named.document);
            assert_eq!(back.cost_centers[0].value, 55.5);
        }
        assert!(documents[0].file_name.starts_with("agendamento_001_"));
        assert!(documents[1].file_name.starts_with("agendamento_002_"));
    }

    #[test]
    fn test_sanitize_description() {
        assert_eq!(sanitize_description("Vale Refeição 08/2026"), "Vale Refeição 082026");
        assert_eq!(sanitize_description("a*b?c"), "abc");
        assert_eq!(sanitize_description("trail   "), "trail");
        assert_eq!(sanitize_description("ok-name_1"), "ok-name_1");
    }

    #[test]
    fn test_discrete_names_are_collision_free() {
        let rows: Vec<ResolvedRow> = (0..12).map(|i| valid_row(i, 1.0)).collect();
        let output = build_export(&rows, &config(), ExportMode::Discrete).unwrap();
        let ExportOutput::Discrete { documents, .. } = output else {
            panic!("expected discrete output");
        };
        let names: std::collections::HashSet<_> =
            documents.iter().map(|d| d.file_name.clone()).collect();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_thousand_row_cardinalities() {
        let rows: Vec<ResolvedRow> = (0..1000).map(|i| valid_row(i, 1.0)).collect();

        let batch = build_export(&rows, &config(), ExportMode::Batch).unwrap();
        assert_eq!(batch.document_count(), 1000);

        let runner = build_export(&rows, &config(), ExportMode::Runner).unwrap();
        let ExportOutput::Runner {
            collection,
            data_rows,
        } = runner
        else {
            panic!("expected runner output");
        };
        assert_eq!(collection.item.len(), 1);
        assert_eq!(data_rows.len(), 1000);

        let discrete = build_export(&rows, &config(), ExportMode::Discrete).unwrap();
        let ExportOutput::Discrete {
            documents,
            manifest,
        } = discrete
        else {
            panic!("expected discrete output");
        };
        assert_eq!(documents.len(), 1000);
        assert_eq!(manifest.len(), 1000);
    }
}
