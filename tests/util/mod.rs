use policy_atlas::model::types::{
    AffectedPopulation, Country, EvidenceQuality, FacetValue, Policy, PolicyType,
};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sets an env var for the guard's lifetime. Pair with `#[serial]`.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }

    pub fn remove(key: &str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

/// Deterministic policy whose facet values cycle through the vocabularies.
#[allow(dead_code)]
pub fn synthetic_policy(i: usize) -> Policy {
    let country = Country::ALL[i % Country::ALL.len()];
    let policy_type = PolicyType::ALL[i % PolicyType::ALL.len()];
    let population = AffectedPopulation::ALL[(i * 3) % AffectedPopulation::ALL.len()];
    let evidence = EvidenceQuality::ALL[(i * 7) % EvidenceQuality::ALL.len()];
    let year_start = 1950 + (i as i32 * 11) % 70;
    let active = i % 3 != 0;
    let year_end = if active {
        None
    } else {
        Some(year_start + (i as i32 % 9))
    };
    serde_json::from_value(json!({
        "id": format!("synthetic-{i}"),
        "name": format!("{} {} program {i}", country.label(), policy_type.label()),
        "country": country.slug(),
        "yearStart": year_start,
        "yearEnd": year_end,
        "isActive": active,
        "policyTypes": [policy_type.slug()],
        "affectedPopulations": [population.slug()],
        "evidenceQuality": evidence.slug(),
        "summaryShort": format!("Support for {} in {}", population.label(), country.label()),
    }))
    .expect("synthetic policy is valid")
}

/// Temp dir holding a dataset file, for `--data`.
#[allow(dead_code)]
pub struct DatasetFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

#[allow(dead_code)]
impl DatasetFixture {
    pub fn write(policies: &[Policy]) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("policies.json");
        std::fs::write(&path, serde_json::to_vec(policies).expect("encode")).expect("write");
        Self { dir, path }
    }

    pub fn raw(contents: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("policies.json");
        std::fs::write(&path, contents).expect("write");
        Self { dir, path }
    }
}
