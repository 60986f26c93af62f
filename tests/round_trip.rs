use std::fs;

use tempfile::tempdir;
use testlink_conv_rs::cli::{default_export_output, default_import_output, run_export, run_import};
use testlink_conv_rs::generator::csv::CsvGenerator;
use testlink_conv_rs::generator::testlink_xml::TestLinkXmlGenerator;
use testlink_conv_rs::parser::csv::{CsvOptions, CsvParser};
use testlink_conv_rs::parser::schema::HeaderVocabulary;
use testlink_conv_rs::parser::testlink_xml::TestLinkXmlParser;
use testlink_conv_rs::testcase::{TestCase, TestSpecification};

const HEADER: &str = "name,version,summary,importance,execution_type,step_number,actions,expected_results";

fn english() -> CsvOptions {
    CsvOptions {
        encoding: "utf-8".to_string(),
        vocabulary: HeaderVocabulary::English,
        ..Default::default()
    }
}

fn to_xml(spec: &TestSpecification) -> String {
    TestLinkXmlGenerator::new(spec).output().unwrap()
}

#[test]
fn csv_to_xml_and_back_keeps_cases_and_steps() {
    let input = format!(
        "{}\n\
         Alpha,2,\"Alpha summary\n・first\n・second\",3,1,1,Open,Opened\n\
         Alpha,,,,,2,\"Type \"\"x\"\"\",Typed\n\
         Alpha,,,,,3,Save,Saved\n\
         Beta,1,Beta summary,1,2,,,\n",
        HEADER
    );

    let (imported, report) = CsvParser::new(english()).parse(&input).unwrap();
    assert_eq!(report.test_cases, 2);
    assert_eq!(report.steps, 3);
    assert!(report.diagnostics.is_empty());

    let from_xml = TestLinkXmlParser::new().parse(&to_xml(&imported)).unwrap();
    assert_eq!(from_xml, imported);

    let (exported, export_report) = CsvGenerator::new(&from_xml, english()).output().unwrap();
    assert_eq!(export_report.rows, 4);

    let (reimported, _) = CsvParser::new(english()).parse(&exported).unwrap();
    assert_eq!(reimported, imported);

    let alpha = &reimported.test_cases[0];
    let numbers: Vec<_> = alpha.steps.iter().map(|s| s.number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);
    assert_eq!(alpha.steps[1].actions, "<p>Type \"x\"</p>");
    assert_eq!(
        alpha.summary,
        "<p>Alpha summary</p>\n<ol>\n<li><p>first</p></li>\n<li><p>second</p></li>\n</ol>"
    );
    let beta = &reimported.test_cases[1];
    assert_eq!(beta.execution_type, "2");
    assert!(beta.steps.is_empty());
}

#[test]
fn login_example_is_restored_on_export() {
    let input = format!(
        "{}\nLogin,1,Enter valid credentials,2,1,1,Open login page,Login form is shown\n",
        HEADER
    );
    let (spec, _) = CsvParser::new(english()).parse(&input).unwrap();
    assert_eq!(spec.case_count(), 1);
    assert_eq!(spec.test_cases[0].name, "Login");
    assert_eq!(spec.test_cases[0].steps[0].number, "1");

    let parsed = TestLinkXmlParser::new().parse(&to_xml(&spec)).unwrap();
    let records = CsvGenerator::new(&parsed, english()).records();
    assert_eq!(records.len(), 2);

    let (header, row) = (&records[0], &records[1]);
    let value = |column: &str| {
        let pos = header.iter().position(|h| h == column).unwrap();
        row[pos].as_str()
    };
    let expected = [
        ("name", "Login"),
        ("version", "1"),
        ("summary", "Enter valid credentials"),
        ("importance", "2"),
        ("execution_type", "1"),
        ("step_number", "1"),
        ("actions", "Open login page"),
        ("expected_results", "Login form is shown"),
    ];
    for (column, v) in expected {
        assert_eq!(value(column), v, "column {}", column);
    }
}

#[test]
fn group_with_blank_summary_is_dropped() {
    let input = format!(
        "{}\nKept,1,s,2,1,1,a,b\nDropped,1,,2,1,1,a,b\nDropped,,,,,2,c,d\n",
        HEADER
    );
    let (spec, report) = CsvParser::new(english()).parse(&input).unwrap();
    assert_eq!(spec.case_count(), 1);
    assert_eq!(spec.test_cases[0].name, "Kept");
    assert_eq!(report.diagnostics.len(), 1);
    assert!(!to_xml(&spec).contains("Dropped"));
}

#[test]
fn always_cdata_fields_are_wrapped_when_empty() {
    let mut spec = TestSpecification::new();
    let mut case = TestCase::new("Empty fields");
    case.version = String::new();
    spec.add_test_case(Some("Suite"), case);

    let xml = to_xml(&spec);
    assert!(xml.contains("<summary><![CDATA[]]></summary>"));
    assert!(xml.contains("<preconditions><![CDATA[]]></preconditions>"));
    assert!(xml.contains("<details><![CDATA[]]></details>"));
    assert!(xml.contains("<version></version>"));
    assert!(xml.contains("<externalid></externalid>"));
    assert!(!xml.contains("/>"));
}

#[test]
fn cdata_terminator_survives_round_trip() {
    let mut spec = TestSpecification::new();
    let mut case = TestCase::new("Brackets");
    case.summary = "<p>x ]]> y</p>".to_string();
    spec.add_test_case(None, case);

    let xml = to_xml(&spec);
    assert!(xml.contains("<![CDATA[<p>x ]]]]><![CDATA[> y</p>]]>"));
    let parsed = TestLinkXmlParser::new().parse(&xml).unwrap();
    assert_eq!(parsed.test_cases[0].summary, "<p>x ]]> y</p>");
}

#[test]
fn shift_jis_files_round_trip_through_the_cli() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("cases.csv");
    let text = "テストケース名,バージョン,サマリ（概要）,重要度,実行タイプ,ステップ番号,アクション（手順）,期待結果,親テストスイート名\r\n\
                ログイン,1,概要,2,1,1,ページを開く,表示される,認証\r\n\
                ログイン,,,,,2,送信する,ようこそ,\r\n";
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(text);
    fs::write(&csv_path, &bytes).unwrap();

    let options = CsvOptions::default();
    let xml_path = default_import_output(&csv_path);
    let import = run_import(&csv_path, &xml_path, &options).unwrap();
    assert_eq!(import.test_cases, 1);
    assert_eq!(import.steps, 2);

    let xml = fs::read_to_string(&xml_path).unwrap();
    assert!(xml.contains("<testsuite name=\"認証\">"));
    assert!(xml.contains("<actions><![CDATA[<p>ページを開く</p>]]></actions>"));

    let back_path = default_export_output(&xml_path);
    let export = run_export(&xml_path, &back_path, &options).unwrap();
    assert_eq!(export.rows, 2);

    let back = fs::read(&back_path).unwrap();
    let (decoded, had_errors) = encoding_rs::SHIFT_JIS.decode_without_bom_handling(&back);
    assert!(!had_errors);
    assert!(decoded.contains("\"ログイン\""));
    assert!(decoded.contains("\"送信する\",\"ようこそ\""));
    assert!(decoded.contains("\"認証\""));
}

#[test]
fn multi_line_custom_field_survives_xml() {
    let input = format!(
        "{},cf:Notes\nNotes,1,s,2,1,1,a,b,\"x\n\ny\"\n",
        HEADER
    );
    let (imported, _) = CsvParser::new(english()).parse(&input).unwrap();
    assert_eq!(imported.test_cases[0].custom_fields[0].value, "x\ny");

    let parsed = TestLinkXmlParser::new().parse(&to_xml(&imported)).unwrap();
    assert_eq!(parsed, imported);
}
