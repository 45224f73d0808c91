use std::fs;

use roulette_core::migrate::{self, SchemaVersion};
use roulette_core::{AppConfig, ConfigError, DocumentStorage, JsonFileStorage};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(config: Result<&AppConfig, &ConfigError>, json_output: bool) -> String {
    let report = build_report(config);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(config: Result<&AppConfig, &ConfigError>) -> DoctorReport {
    let mut checks = Vec::new();

    match config {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_document(config));
            checks.push(check_storage_writable(config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["document_readable", "schema_version", "storage_writable"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_document(config: &AppConfig) -> Vec<DoctorCheck> {
    let storage = JsonFileStorage::new(&config.storage.data_path);
    let location = storage.path().display().to_string();

    let raw = match storage.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return vec![
                DoctorCheck {
                    name: "document_readable",
                    status: CheckStatus::Pass,
                    details: format!(
                        "no document at `{location}` yet, one is created on first change"
                    ),
                },
                DoctorCheck {
                    name: "schema_version",
                    status: CheckStatus::Pass,
                    details: format!("new documents use schema {}", SchemaVersion::CURRENT.tag()),
                },
            ];
        }
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "document_readable",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
                skipped_schema_check(),
            ];
        }
    };

    match migrate::decode(&raw) {
        Ok(document) => {
            let schema = document.schema();
            let schema_check = if schema < SchemaVersion::CURRENT {
                DoctorCheck {
                    name: "schema_version",
                    status: CheckStatus::Fail,
                    details: format!(
                        "document uses schema {}, run `roulette migrate` to upgrade",
                        schema.tag()
                    ),
                }
            } else {
                DoctorCheck {
                    name: "schema_version",
                    status: CheckStatus::Pass,
                    details: format!("document uses current schema {}", schema.tag()),
                }
            };
            vec![
                DoctorCheck {
                    name: "document_readable",
                    status: CheckStatus::Pass,
                    details: format!("`{location}` parsed"),
                },
                schema_check,
            ]
        }
        Err(error) => vec![
            DoctorCheck {
                name: "document_readable",
                status: CheckStatus::Fail,
                details: format!(
                    "`{location}` is not a valid document ({error}); it would be replaced by an empty one"
                ),
            },
            skipped_schema_check(),
        ],
    }
}

fn skipped_schema_check() -> DoctorCheck {
    DoctorCheck {
        name: "schema_version",
        status: CheckStatus::Skipped,
        details: "skipped because the document could not be read".to_string(),
    }
}

fn check_storage_writable(config: &AppConfig) -> DoctorCheck {
    let path = &config.storage.data_path;
    let target = if path.exists() {
        path.clone()
    } else {
        match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => return pass_writable("document will be created in the working directory"),
        }
    };

    match fs::metadata(&target) {
        Ok(metadata) if metadata.permissions().readonly() => DoctorCheck {
            name: "storage_writable",
            status: CheckStatus::Fail,
            details: format!("`{}` is read-only", target.display()),
        },
        Ok(_) => pass_writable(&format!("`{}` is writable", target.display())),
        Err(_) if !path.exists() => {
            pass_writable("parent directory will be created on first change")
        }
        Err(error) => DoctorCheck {
            name: "storage_writable",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn pass_writable(details: &str) -> DoctorCheck {
    DoctorCheck {
        name: "storage_writable",
        status: CheckStatus::Pass,
        details: details.to_string(),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }
    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
