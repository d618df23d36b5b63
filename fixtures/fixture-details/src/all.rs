// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    details::{arb_fixture, known_fixtures, Fixture},
    value_generator::ValueGenerator,
};
use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::{eyre::WrapErr, Result};
use mlca::config::AnalysisConfig;
use once_cell::sync::Lazy;
use std::{collections::BTreeMap, fs};
use tracing::info;

/// Seed for the random fixtures written by [`AllFixtures::generate_inputs`].
pub const RANDOM_SEED: &str = "mlca-random";

/// The known scenarios plus every fixture stored in the data directory.
pub struct AllFixtures {
    dir: Utf8PathBuf,
    fixtures: BTreeMap<String, Fixture>,
}

static ALL_FIXTURES_STATIC: Lazy<AllFixtures> = Lazy::new(AllFixtures::init);

impl AllFixtures {
    pub fn get() -> &'static Self {
        &*ALL_FIXTURES_STATIC
    }

    fn init() -> Self {
        let dir = Self::default_dir();
        match Self::load(dir.clone()) {
            Ok(fixtures) => fixtures,
            Err(err) => panic!("failed to load fixtures from {}: {:?}", dir, err),
        }
    }

    pub fn default_dir() -> Utf8PathBuf {
        let dir: Utf8PathBuf = env!("CARGO_MANIFEST_DIR").into();
        dir.parent().unwrap().join("data")
    }

    /// Loads the known scenarios, then every `*.toml` fixture in `dir/inputs`.
    pub fn load(dir: Utf8PathBuf) -> Result<Self> {
        let mut fixtures: BTreeMap<String, Fixture> = known_fixtures()
            .into_iter()
            .map(|fixture| (fixture.name.clone(), fixture))
            .collect();

        let inputs = dir.join("inputs");
        if inputs.is_dir() {
            let mut paths = Vec::new();
            for entry in fs::read_dir(&inputs).wrap_err_with(|| format!("reading {}", inputs))? {
                let path = Utf8PathBuf::try_from(entry?.path())?;
                if path.extension() == Some("toml") {
                    paths.push(path);
                }
            }
            paths.sort();
            for path in paths {
                let contents =
                    fs::read_to_string(&path).wrap_err_with(|| format!("reading {}", path))?;
                let fixture =
                    Fixture::from_toml(&contents).wrap_err_with(|| format!("parsing {}", path))?;
                fixtures.insert(fixture.name.clone(), fixture);
            }
        }

        Ok(Self { dir, fixtures })
    }

    #[inline]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> + '_ {
        self.fixtures.values()
    }

    pub fn fixture(&self, name: &str) -> Option<&Fixture> {
        self.fixtures.get(name)
    }

    /// Writes the known scenarios and `count` seeded random fixtures to `dir/inputs`.
    pub fn generate_inputs(dir: &Utf8Path, count: usize) -> Result<()> {
        let inputs = dir.join("inputs");
        fs::create_dir_all(&inputs).wrap_err_with(|| format!("creating {}", inputs))?;

        let mut value_gen = ValueGenerator::from_seed(RANDOM_SEED);
        let random = (0..count).map(|ix| {
            let mut gen = value_gen.partial_clone();
            // Alternate between two and three root factors.
            gen.generate(arb_fixture(format!("random-{:03}", ix), 2 + ix % 2, 2))
        });

        let mut written = 0;
        for fixture in known_fixtures().into_iter().chain(random) {
            let path = inputs.join(format!("{}.toml", fixture.name));
            let contents = fixture
                .to_toml()
                .wrap_err_with(|| format!("serializing {}", fixture.name))?;
            fs::write(&path, contents).wrap_err_with(|| format!("writing {}", path))?;
            written += 1;
        }

        info!(dir = %inputs, fixtures = written, "generated inputs");
        Ok(())
    }

    /// Analyzes every fixture and writes its report to `dir/outputs/<name>.json`.
    pub fn generate_outputs(&self, config: &AnalysisConfig) -> Result<()> {
        let outputs = self.dir.join("outputs");
        fs::create_dir_all(&outputs).wrap_err_with(|| format!("creating {}", outputs))?;

        for fixture in self.fixtures() {
            let report = fixture
                .analyze(config.clone())
                .wrap_err_with(|| format!("analyzing {}", fixture.name))?;
            let path = outputs.join(format!("{}.json", fixture.name));
            fs::write(&path, serde_json::to_string_pretty(&report)?)
                .wrap_err_with(|| format!("writing {}", path))?;
            info!(
                fixture = %fixture.name,
                models = report.models.len(),
                unresolved = report.unresolved.len(),
                "wrote output"
            );
        }
        Ok(())
    }
}
