// ==========================================
// 起点清单导入集成测试
// ==========================================
// 测试目标: CSV 导入 → 批量比选,行级错误带行号
// ==========================================


use port_cost_compare::domain::Coordinate;
use port_cost_compare::engine::BatchEvaluator;
use port_cost_compare::importer::{EntityImporter, ImportError};
use std::io::Write;
use tempfile::Builder;
use test_helpers::default_config;

fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(temp_file, "{}", line).unwrap();
    }
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_import_then_batch_evaluate() {
    let file = write_csv(&[
        "id,nombre,provincia,volumen_anual,lon,lat,dist_a,dist_b",
        "S1,Rosario Norte,santa_fe,1000,-60.70,-32.90,300,450",
        "S2,Junin,buenos_aires,2000,-60.95,-34.58,500,200",
        "S3,Sin volumen,cordoba,,-64.18,-31.42,600,700",
        "S4,Sin distancias,entre_rios,800,-60.52,-31.73,,",
    ]);

    let report = EntityImporter::new().import_file(file.path()).unwrap();
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.accepted(), 3);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].row_number, 4);

    let s1 = &report.records[0];
    assert_eq!(s1.region.as_deref(), Some("santa_fe"));
    assert_eq!(s1.origin, Some(Coordinate { lon: -60.70, lat: -32.90 }));
    assert_eq!(s1.row_number, Some(2));

    // S4 缺距离,在批量阶段被剔除
    let outcome = BatchEvaluator::new(default_config())
        .evaluate(&report.records, None)
        .unwrap();
    assert_eq!(outcome.stats.evaluated, 2);
    assert_eq!(outcome.stats.excluded, 1);
    assert_eq!(outcome.excluded[0].entity_id, "S4");
}

#[test]
fn test_out_of_range_coordinates_rejected() {
    // 纬度越界: 拒绝该行,不尝试交换经纬度
    let file = write_csv(&[
        "id,volume_t,lon,lat",
        "S1,100,-32.66,-160.75",
        "S2,100,-60.75,-32.66",
    ]);

    let report = EntityImporter::new().import_file(file.path()).unwrap();
    assert_eq!(report.accepted(), 1);
    assert_eq!(report.records[0].id, "S2");
    assert_eq!(report.rejected[0].row_number, 2);
}

#[test]
fn test_file_level_errors() {
    let missing = EntityImporter::new().import_file("/no/such/dir/origins.csv");
    assert!(matches!(missing, Err(ImportError::FileNotFound(_))));

    let txt = Builder::new().suffix(".txt").tempfile().unwrap();
    let unsupported = EntityImporter::new().import_file(txt.path());
    assert!(matches!(unsupported, Err(ImportError::UnsupportedFormat(_))));
}
