//! Subcommand bodies. Each returns a short summary for the final status line.

use std::{fs, path::Path};

use ai_llm_service::service_profiles::LlmServiceProfiles;
use anyhow::{Context, Result, bail};
use drug_db::{openfda::RawEntry, save_records};
use harmonizer::normalize_leaflet;
use serde_json::Value;
use tracing::info;

use crate::{cli::FetchArgs, openfda_client::OpenFdaClient, seed::read_seed_list};

pub async fn fetch(args: &FetchArgs) -> Result<String> {
    let generics = read_seed_list(&args.seed)?;
    if generics.is_empty() {
        bail!("seed list {} contains no names", args.seed.display());
    }
    info!(count = generics.len(), seed = %args.seed.display(), "seed list loaded");

    let client = OpenFdaClient::new(args.api_key.clone())?;
    let entries = client.fetch_all(&generics).await;
    write_raw(&args.out, &entries)?;

    let labelled = entries.iter().filter(|e| e.label_raw.is_some()).count();
    Ok(format!(
        "fetched {labelled}/{} labels into {}",
        entries.len(),
        args.out.display()
    ))
}

pub fn write_raw(path: &Path, entries: &[RawEntry]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(entries)?;
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), entries = entries.len(), "raw openFDA DB written");
    Ok(())
}

pub fn convert(raw: &Path, out: &Path) -> Result<String> {
    let text = fs::read_to_string(raw)
        .with_context(|| format!("raw DB not found at {}", raw.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", raw.display()))?;
    let records = drug_db::openfda::convert_raw_db(&value)?;
    save_records(out, &records)?;
    Ok(format!("wrote {} records to {}", records.len(), out.display()))
}

/// Normalizes one leaflet and writes the recovered object pretty-printed.
pub async fn leaflet(llm: &LlmServiceProfiles, input: &Path, output: &Path) -> Result<String> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read leaflet {}", input.display()))?;
    let value = normalize_leaflet(llm, &text).await?;

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }
    fs::write(output, serde_json::to_string_pretty(&value)?)
        .with_context(|| format!("cannot write {}", output.display()))?;
    Ok(format!("generated {}", output.display()))
}

#[cfg(test)]
mod tests {
    use ai_llm_service::{
        LlmProvider,
        test_support::{MockLlm, MockReply},
    };
    use drug_db::DrugDb;
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_file_converts_into_a_loadable_db() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw/otc_db_openfda_raw.json");
        let out = dir.path().join("otc_db.json");

        write_raw(
            &raw,
            &[
                RawEntry {
                    generic_query: "ibuprofen".into(),
                    label_raw: Some(json!({
                        "openfda": {"generic_name": ["Ibuprofen"], "brand_name": ["Advil"]},
                        "indications_and_usage": ["temporarily relieves minor aches and pains"]
                    })),
                    ndc_raw: None,
                },
                RawEntry {
                    generic_query: "unobtainium".into(),
                    ..Default::default()
                },
            ],
        )
        .unwrap();

        let summary = convert(&raw, &out).unwrap();
        assert!(summary.starts_with("wrote 2 records"));

        let db = DrugDb::load(&out).unwrap();
        assert_eq!(db.len(), 2);
        assert!(db.lookup("ADVIL").is_some());
        assert!(db.find_by_generic_name("UNOBTAINIUM").is_some());
    }

    #[test]
    fn convert_rejects_non_list() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.json");
        fs::write(&raw, r#"{"generic_query": "ibuprofen"}"#).unwrap();
        let err = convert(&raw, &dir.path().join("out.json")).unwrap_err();
        assert!(err.to_string().contains("must be a list"));
    }

    #[tokio::test]
    async fn leaflet_is_written_pretty() {
        let mock = MockLlm::start(vec![MockReply::content(
            "Here you go:\n{\"generic_name\": \"氯雷他定\", \"aliases\": [\"Claritin\"]}",
        )])
        .await;
        let llm = LlmServiceProfiles::from_base(&mock.config(LlmProvider::Zhipu), Some(5)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("leaflet.txt");
        let output = dir.path().join("out/loratadine.json");
        fs::write(&input, "氯雷他定片说明书 ...").unwrap();

        leaflet(&llm, &input, &output).await.unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("氯雷他定"));
        assert!(written.contains('\n'));
        let v: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(v["aliases"][0], "Claritin");

        let reqs = mock.requests().await;
        assert_eq!(reqs[0].message(1), "氯雷他定片说明书 ...");
        assert_eq!(reqs[0].body["temperature"], 0.0);
    }
}
