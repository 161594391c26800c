// ==========================================
// 港口成本比选系统 - 字段映射器实现
// ==========================================
// 职责: 源列（含别名）→ EntityRecord 字段 + 类型转换
// 标准列: id,name,region,volume_t,lon,lat,distance_a_km,distance_b_km
// 红线: 坐标按 (lon, lat) 读取,不做顺序推断或交换
// ==========================================

use crate::domain::coordinate::Coordinate;
use crate::domain::entity::EntityRecord;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct FieldMapper;

impl FieldMapper {
    /// 行 → EntityRecord
    ///
    /// # 错误
    /// - PrimaryKeyMissing: id 为空
    /// - FieldMappingError: 缺少 volume_t,或 lon/lat 只给了一个
    /// - TypeConversionError: 数值列无法解析
    /// - InvalidCoordinate: 经纬度越界
    pub fn map_to_entity_record(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<EntityRecord> {
        let id = self
            .get_string(row, "id")
            .ok_or(ImportError::PrimaryKeyMissing(row_number))?;

        let volume_t = self
            .parse_f64(row, "volume_t", row_number)?
            .ok_or_else(|| ImportError::FieldMappingError {
                row: row_number,
                message: "缺少年运量列 volume_t".to_string(),
            })?;

        let origin = match (
            self.parse_f64(row, "lon", row_number)?,
            self.parse_f64(row, "lat", row_number)?,
        ) {
            (Some(lon), Some(lat)) => Some(Coordinate::new(lon, lat).map_err(|e| {
                ImportError::InvalidCoordinate {
                    row: row_number,
                    message: e.to_string(),
                }
            })?),
            (None, None) => None,
            _ => {
                return Err(ImportError::FieldMappingError {
                    row: row_number,
                    message: "经度与纬度必须同时提供".to_string(),
                })
            }
        };

        Ok(EntityRecord {
            id,
            name: self.get_string(row, "name"),
            region: self.get_string(row, "region").map(|r| r.to_lowercase()),
            volume_t,
            origin,
            distance_a_km: self.parse_f64(row, "distance_a_km", row_number)?,
            distance_b_km: self.parse_f64(row, "distance_b_km", row_number)?,
            row_number: Some(row_number),
        })
    }

    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            "id" => &["id", "ID", "编号", "codigo"],
            "name" => &["name", "名称", "nombre", "empresa"],
            "region" => &["region", "区域", "provincia"],
            "volume_t" => &["volume_t", "volume", "年运量", "volumen_anual", "produccion_total"],
            "lon" => &["lon", "lng", "longitude", "经度"],
            "lat" => &["lat", "latitude", "纬度"],
            "distance_a_km" => &["distance_a_km", "dist_a", "距离A"],
            "distance_b_km" => &["distance_b_km", "dist_b", "距离B"],
            _ => &[],
        };

        aliases
            .iter()
            .chain(std::iter::once(&key))
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 解析浮点数（空值返回 None,非法值报 TypeConversionError）
    fn parse_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(raw) => {
                // 允许千分位逗号
                let cleaned = raw.replace(',', "");
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Some)
                    .ok_or_else(|| ImportError::TypeConversionError {
                        row: row_number,
                        field: key.to_string(),
                        message: format!("无法解析为数值: {}", raw),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_full_row() {
        let record = FieldMapper
            .map_to_entity_record(
                &row(&[
                    ("id", "S1"),
                    ("nombre", "Sector Norte"),
                    ("region", "Santa_Fe"),
                    ("volume", "12,500"),
                    ("lon", "-61.2"),
                    ("lat", "-31.6"),
                    ("distance_a_km", "300"),
                    ("distance_b_km", "450.5"),
                ]),
                2,
            )
            .unwrap();

        assert_eq!(record.id, "S1");
        assert_eq!(record.name.as_deref(), Some("Sector Norte"));
        assert_eq!(record.region.as_deref(), Some("santa_fe"));
        assert_eq!(record.volume_t, 12_500.0);
        assert_eq!(record.origin, Some(Coordinate { lon: -61.2, lat: -31.6 }));
        assert_eq!(record.distance_b_km, Some(450.5));
        assert_eq!(record.row_number, Some(2));
    }

    #[test]
    fn test_row_errors_carry_row_number() {
        let missing_id = FieldMapper.map_to_entity_record(&row(&[("volume_t", "10")]), 3);
        assert!(matches!(missing_id, Err(ImportError::PrimaryKeyMissing(3))));

        let bad_volume = FieldMapper
            .map_to_entity_record(&row(&[("id", "S1"), ("volume_t", "mucho")]), 4)
            .unwrap_err();
        assert_eq!(bad_volume.row(), Some(4));
        assert!(matches!(bad_volume, ImportError::TypeConversionError { .. }));

        let half_coordinate = FieldMapper
            .map_to_entity_record(&row(&[("id", "S1"), ("volume_t", "10"), ("lon", "-60")]), 5)
            .unwrap_err();
        assert!(matches!(half_coordinate, ImportError::FieldMappingError { row: 5, .. }));

        // 纬度越界不做交换
        let swapped = FieldMapper
            .map_to_entity_record(
                &row(&[("id", "S1"), ("volume_t", "10"), ("lon", "-32.6"), ("lat", "-160.7")]),
                6,
            )
            .unwrap_err();
        assert!(matches!(swapped, ImportError::InvalidCoordinate { row: 6, .. }));
    }
}
