// ==========================================
// 港口成本比选系统 - 地理坐标
// ==========================================
// 红线: 入口处必须使用具名字段 {lon, lat}
// 红线: 不按数值范围推断经纬度顺序
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 地理坐标（经度, 纬度）
///
/// 反序列化只接受 `{"lon": .., "lat": ..}`，不接受无标签数组，
/// 避免 (lat, lon) 与 (lon, lat) 混用时被静默翻转。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    /// 经度 [-180, 180]
    pub lon: f64,
    /// 纬度 [-90, 90]
    pub lat: f64,
}

impl Coordinate {
    /// 构造并校验坐标
    pub fn new(lon: f64, lat: f64) -> EngineResult<Self> {
        let coordinate = Self { lon, lat };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// 校验坐标范围
    ///
    /// 反序列化得到的坐标未经过 `new`，进入计算前需要再调用一次。
    pub fn validate(&self) -> EngineResult<()> {
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        if lon_ok && lat_ok {
            Ok(())
        } else {
            Err(EngineError::InvalidCoordinate {
                lon: self.lon,
                lat: self.lat,
            })
        }
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            Lon,
            Lat,
        }

        struct CoordinateVisitor;

        impl<'de> Visitor<'de> for CoordinateVisitor {
            type Value = Coordinate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("坐标必须使用 {lon, lat} 具名字段")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Coordinate, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut lon = None;
                let mut lat = None;
                while let Some(field) = map.next_key()? {
                    match field {
                        Field::Lon => {
                            if lon.is_some() {
                                return Err(de::Error::duplicate_field("lon"));
                            }
                            lon = Some(map.next_value()?);
                        }
                        Field::Lat => {
                            if lat.is_some() {
                                return Err(de::Error::duplicate_field("lat"));
                            }
                            lat = Some(map.next_value()?);
                        }
                    }
                }
                Ok(Coordinate {
                    lon: lon.ok_or_else(|| de::Error::missing_field("lon"))?,
                    lat: lat.ok_or_else(|| de::Error::missing_field("lat"))?,
                })
            }
        }

        // 只走 map 通道: 序列形式（[lon, lat]）直接报类型错误
        deserializer.deserialize_map(CoordinateVisitor)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lon={:.4}, lat={:.4})", self.lon, self.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let c = Coordinate::new(-60.7489, -32.6636).unwrap();
        assert_eq!(c.lon, -60.7489);
        assert_eq!(c.lat, -32.6636);
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        // 纬度越界: 不做翻转,直接拒绝
        let result = Coordinate::new(-32.6636, -120.0);
        assert!(matches!(result, Err(EngineError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_ambiguous_pair_kept_as_given() {
        // 两个分量都落在 [-90, 90]: 按字段原样保留
        let c = Coordinate::new(-34.1, -59.0).unwrap();
        assert_eq!(c.lon, -34.1);
        assert_eq!(c.lat, -59.0);
    }

    #[test]
    fn test_deserialize_requires_named_fields() {
        let ok: Coordinate = serde_json::from_str(r#"{"lon": -59.03, "lat": -34.10}"#).unwrap();
        assert_eq!(ok.lat, -34.10);

        let tuple = serde_json::from_str::<Coordinate>("[-59.03, -34.10]");
        assert!(tuple.is_err());

        let extra = serde_json::from_str::<Coordinate>(r#"{"lon": 1.0, "lat": 2.0, "alt": 3.0}"#);
        assert!(extra.is_err());

        let missing = serde_json::from_str::<Coordinate>(r#"{"lon": 1.0}"#);
        assert!(missing.is_err());

        let nan = Coordinate {
            lon: f64::NAN,
            lat: 0.0,
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_non_json_map() {
        // 非 JSON 来源（serde 通用 map）同样可用
        use serde::de::value::{Error as ValueError, MapDeserializer};

        let entries = vec![("lat", -34.10), ("lon", -59.03)];
        let c = Coordinate::deserialize(MapDeserializer::<_, ValueError>::new(entries.into_iter()))
            .unwrap();
        assert_eq!(c, Coordinate { lon: -59.03, lat: -34.10 });

        let unknown = vec![("lon", 1.0), ("alt", 3.0)];
        let err = Coordinate::deserialize(MapDeserializer::<_, ValueError>::new(unknown.into_iter()));
        assert!(err.is_err());
    }
}
