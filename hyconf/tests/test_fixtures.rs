use std::{fs::File, io::Read, path::Path};

use datatest_stable::Result;
use hyconf::{LoadOptions, Syntax};
use serde::Deserialize;

#[derive(Deserialize)]
struct ParseTestOptions {
    syntax: Option<String>,
    #[serde(rename = "maxDepth")]
    max_depth: Option<usize>,
}

impl ParseTestOptions {
    fn to_load_options(&self) -> LoadOptions {
        let mut opts = LoadOptions::default();

        if let Some(ref syntax) = self.syntax {
            opts.syntax = Syntax::from_name(syntax);
        }

        if let Some(max_depth) = self.max_depth {
            opts.max_depth = max_depth;
        }

        opts
    }
}

#[derive(Deserialize)]
struct ParseTest {
    name: String,
    input: String,
    #[serde(default)]
    expected: serde_json::Value,
    #[serde(rename = "shouldError", default)]
    should_error: bool,
    options: Option<ParseTestOptions>,
}

#[derive(Deserialize)]
struct Fixture {
    description: String,
    tests: Vec<ParseTest>,
}

fn test_parse_fixture(path: &Path) -> Result<()> {
    let mut file = File::open(path)?;
    let mut json_string = String::new();
    file.read_to_string(&mut json_string)?;

    let fixture: Fixture = serde_json::from_str(&json_string)?;

    for test in fixture.tests {
        let opts = test
            .options
            .as_ref()
            .map(ParseTestOptions::to_load_options)
            .unwrap_or_default();
        let result = hyconf::from_str_with_options(&test.input, &opts);

        if test.should_error {
            assert!(
                result.is_err(),
                "expected error but got success: fixture {}, file: {}",
                test.name,
                fixture.description
            );
        } else {
            let document = result.unwrap_or_else(|e| {
                panic!("parse failed: fixture {}, file: {}: {}", test.name, fixture.description, e)
            });
            let output = serde_json::to_value(&document)?;
            assert_eq!(
                output, test.expected,
                "result does not match expected: {}, file: {}",
                test.name, fixture.description
            );
        }
    }

    Ok(())
}

datatest_stable::harness! {
    { test = test_parse_fixture, root = "tests/fixtures/parse", pattern = r"^.*\.json$" },
}
