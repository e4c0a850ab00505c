use facts_core::report::{IssueKind, Report};
use serde_json::{json, Value};

fn report_with_imports(imports: Value) -> Vec<u8> {
    let doc = json!({
        "target": { "file": { "type": "PE", "md5": "a", "sha1": "b", "sha256": "c" } },
        "info": { "version": "2.4" },
        "static": { "pe": { "imagebase": 4194304, "imports": imports } },
        "behavior": { "processes": [] }
    });
    serde_json::to_vec(&doc).expect("serialize fixture")
}

#[test]
fn list_and_mapping_forms_parse_to_the_same_groups() {
    let symbols = json!([
        { "address": "0x402000", "name": "CreateFileW" },
        { "address": "0x402004", "name": "CloseHandle" }
    ]);

    let as_list = Report::parse(&report_with_imports(json!([
        { "dll": "k32.dll", "imports": symbols.clone() }
    ])))
    .expect("list form");
    let as_map = Report::parse(&report_with_imports(json!({
        "k32.dll": { "imports": symbols }
    })))
    .expect("mapping form");

    let list_pe = as_list.pe().expect("pe");
    let map_pe = as_map.pe().expect("pe");
    assert_eq!(list_pe.imports, map_pe.imports);
    assert_eq!(map_pe.imports[0].dll, "k32.dll");
    assert_eq!(map_pe.imports[0].imports[1].address, 0x402004);
}

#[test]
fn mapping_form_keeps_input_order() {
    let report = Report::parse(&report_with_imports(json!({
        "user32.dll": { "imports": [] },
        "advapi32.dll": { "imports": [] },
        "kernel32.dll": { "imports": [] }
    })))
    .expect("mapping form");

    let names: Vec<&str> =
        report.pe().expect("pe").imports.iter().map(|group| group.dll.as_str()).collect();
    assert_eq!(names, vec!["user32.dll", "advapi32.dll", "kernel32.dll"]);
}

#[test]
fn explicit_dll_inside_mapping_entry_wins_over_key() {
    let report = Report::parse(&report_with_imports(json!({
        "k32": { "dll": "KERNEL32.dll", "imports": [] }
    })))
    .expect("mapping form");
    assert_eq!(report.pe().expect("pe").imports[0].dll, "KERNEL32.dll");
}

#[test]
fn absent_imports_default_to_empty() {
    let doc = json!({
        "target": { "file": { "type": "PE", "md5": "a", "sha1": "b", "sha256": "c" } },
        "info": { "version": "2.4" },
        "static": { "pe": { "imagebase": 0 } },
        "behavior": { "processes": [] }
    });
    let report = Report::parse(&serde_json::to_vec(&doc).expect("serialize")).expect("parse");
    let pe = report.pe().expect("pe");
    assert!(pe.imports.is_empty());
    assert!(pe.exports.is_empty());
    assert!(pe.sections.is_empty());
}

#[test]
fn mapping_entry_problems_are_reported_under_the_key() {
    let err = Report::parse(&report_with_imports(json!({
        "k32.dll": { "imports": [ { "name": "CreateFileW" } ] },
        "bad.dll": "nope"
    })))
    .expect_err("broken entries");

    assert_eq!(
        err.issue_at(r#"static.pe.imports["k32.dll"].imports[0].address"#),
        Some(&IssueKind::Missing)
    );
    assert_eq!(
        err.issue_at(r#"static.pe.imports["bad.dll"]"#),
        Some(&IssueKind::Mistyped { expected: "object", found: "string" })
    );
}

#[test]
fn list_form_requires_dll_name() {
    let err = Report::parse(&report_with_imports(json!([{ "imports": [] }])))
        .expect_err("missing dll");
    assert_eq!(err.paths(), vec!["static.pe.imports[0].dll"]);
}

#[test]
fn scalar_imports_are_mistyped() {
    let err = Report::parse(&report_with_imports(json!("kernel32.dll"))).expect_err("scalar");
    assert_eq!(
        err.issue_at("static.pe.imports"),
        Some(&IssueKind::Mistyped { expected: "array or object", found: "string" })
    );
}
