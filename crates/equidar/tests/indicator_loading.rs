use equidar::indicators::{
    IndicatorLoadError, IndicatorLoader, IndicatorSource, LayoutKind, SchemaError, Stage,
};
use equidar::IndicatorStore;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn sources() -> Vec<IndicatorSource> {
    vec![
        IndicatorSource::new(Stage::EarlyGrades, fixture("ideb_anos_iniciais.csv")),
        IndicatorSource::new(Stage::LateGrades, fixture("ideb_anos_finais.csv")),
        IndicatorSource::new(Stage::UpperSecondary, fixture("ideb_ensino_medio.csv")),
    ]
}

#[test]
fn loads_mixed_layouts_into_one_record_set() {
    let loaded = IndicatorLoader::load_all(&sources()).expect("fixtures load");

    let layouts: Vec<(Stage, LayoutKind, usize, usize)> = loaded
        .sources
        .iter()
        .map(|summary| (summary.stage, summary.layout, summary.rows, summary.records))
        .collect();
    assert_eq!(
        layouts,
        vec![
            (Stage::EarlyGrades, LayoutKind::Wide, 3, 9),
            (Stage::LateGrades, LayoutKind::Long, 2, 2),
            (Stage::UpperSecondary, LayoutKind::Wide, 1, 3),
        ]
    );
    assert_eq!(loaded.records.len(), 14);

    let upper_secondary = &loaded.sources[2];
    assert_eq!(upper_secondary.warnings.non_numeric, 1);

    let alfa_2021 = loaded
        .records
        .iter()
        .find(|record| record.school_id == "25000001" && record.year == Some(2021))
        .expect("alfa 2021 row");
    assert_eq!(alfa_2021.stage, Stage::EarlyGrades);
    assert_eq!(alfa_2021.metrics.approval_rate, Some(0.90));
    assert_eq!(alfa_2021.metrics.math_score, Some(225.0));
    assert_eq!(alfa_2021.metrics.composite_index, Some(5.5));
    assert_eq!(alfa_2021.metrics.composite_projection, Some(5.4));
    assert_eq!(alfa_2021.municipality_code.as_deref(), Some("2504009"));
    assert_eq!(alfa_2021.network.as_deref(), Some("Estadual"));
}

#[test]
fn sentinels_and_garbage_become_null_not_zero() {
    let loaded = IndicatorLoader::load_all(&sources()).expect("fixtures load");

    let delta_2019 = loaded
        .records
        .iter()
        .find(|record| record.school_id == "25000004" && record.year == Some(2019))
        .expect("delta 2019 row");
    assert_eq!(delta_2019.metrics.composite_index, None);

    let beta_ef1_2021 = loaded
        .records
        .iter()
        .find(|record| {
            record.school_id == "25000002"
                && record.stage == Stage::EarlyGrades
                && record.year == Some(2021)
        })
        .expect("beta early grades 2021 row");
    assert!(beta_ef1_2021.metrics.is_empty());
}

#[test]
fn store_indexes_schools_by_normalized_municipality() {
    let loaded = IndicatorLoader::load_all(&sources()).expect("fixtures load");
    let store = IndicatorStore::from_loaded(loaded);

    let stats = store.stats();
    assert_eq!(stats.records, 14);
    assert_eq!(stats.schools, 4);
    assert_eq!(stats.municipalities, 2);

    let names: Vec<&str> = store
        .schools_by_municipality("campina grande")
        .into_iter()
        .map(|school| school.name.as_str())
        .collect();
    assert_eq!(names, vec!["ECI Delta", "EEEF Alfa", "EMEF Beta"]);

    let joao_pessoa = store.schools_by_municipality("joao pessoa");
    assert_eq!(joao_pessoa.len(), 1);
    assert_eq!(joao_pessoa[0].municipality, "João Pessoa");

    assert_eq!(
        store.stages_for_school("25000002"),
        vec![Stage::EarlyGrades, Stage::LateGrades]
    );
    assert_eq!(store.records_by_municipality("campina grande", Some(2021)).len(), 4);
    assert!(store.records_by_school("99999999").is_empty());
}

#[test]
fn missing_source_file_names_stage_and_path() {
    let mut sources = sources();
    sources[1] = IndicatorSource::new(Stage::LateGrades, fixture("absent.csv"));

    let err = IndicatorLoader::load_all(&sources).expect_err("missing file fails");
    match err {
        IndicatorLoadError::Source { stage, path, source } => {
            assert_eq!(stage, Stage::LateGrades);
            assert!(path.ends_with("absent.csv"));
            assert!(matches!(*source, IndicatorLoadError::Io(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn export_without_year_information_is_rejected() {
    let csv = "ID_ESCOLA,NO_ESCOLA,NO_MUNICIPIO,VL_OBSERVADO\n1,Escola,Sousa,4.0\n";
    let err = IndicatorLoader::from_reader(csv.as_bytes(), Stage::EarlyGrades)
        .expect_err("layout is unrecognized");
    assert!(matches!(
        err,
        IndicatorLoadError::Schema(SchemaError::UnrecognizedLayout { .. })
    ));
}

#[test]
fn export_without_school_name_is_rejected() {
    let csv = "ID_ESCOLA,NO_MUNICIPIO,VL_OBSERVADO_2021\n1,Sousa,4.0\n";
    let err = IndicatorLoader::from_reader(csv.as_bytes(), Stage::EarlyGrades)
        .expect_err("school name is required");
    assert!(matches!(
        err,
        IndicatorLoadError::Schema(SchemaError::MissingColumn { .. })
    ));
}
