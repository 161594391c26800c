// ==========================================
// 港口成本比选系统 - 距离服务接口
// ==========================================
// 职责: (起点, 终点) → 陆运距离 + 行驶时间
// 红线: 引擎不直接调用距离服务;失败原样交给调用方,不重试、不替换默认距离
// 实现:
// - StaticDistanceProvider: 预置路线表（测试 / 离线批量）
// - GreatCircleDistanceProvider: 大圆距离 × 绕行系数（无路网时的估算）
// ==========================================

use crate::domain::coordinate::Coordinate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// 地球平均半径（km）
const EARTH_RADIUS_KM: f64 = 6_371.0;

// ==========================================
// 类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteDistance {
    pub distance_km: f64,
    pub duration_min: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistanceError {
    #[error("距离服务连接失败: {0}")]
    ConnectionFailed(String),

    #[error("距离服务响应非法: {0}")]
    InvalidResponse(String),
}

// ==========================================
// DistanceProvider Trait
// ==========================================
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn get_distance(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<RouteDistance, DistanceError>;
}

/// 校验服务返回值（非负有限数）
pub fn validate_route(route: RouteDistance) -> Result<RouteDistance, DistanceError> {
    let ok = |v: f64| v.is_finite() && v >= 0.0;
    if ok(route.distance_km) && ok(route.duration_min) {
        Ok(route)
    } else {
        Err(DistanceError::InvalidResponse(format!(
            "distance_km={}, duration_min={}",
            route.distance_km, route.duration_min
        )))
    }
}

// ==========================================
// StaticDistanceProvider - 预置路线表
// ==========================================
type RouteKey = (u64, u64, u64, u64);

fn route_key(origin: &Coordinate, destination: &Coordinate) -> RouteKey {
    (
        origin.lon.to_bits(),
        origin.lat.to_bits(),
        destination.lon.to_bits(),
        destination.lat.to_bits(),
    )
}

#[derive(Debug, Clone, Default)]
pub struct StaticDistanceProvider {
    routes: HashMap<RouteKey, RouteDistance>,
}

impl StaticDistanceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(
        mut self,
        origin: Coordinate,
        destination: Coordinate,
        distance_km: f64,
        duration_min: f64,
    ) -> Self {
        self.routes.insert(
            route_key(&origin, &destination),
            RouteDistance {
                distance_km,
                duration_min,
            },
        );
        self
    }
}

#[async_trait]
impl DistanceProvider for StaticDistanceProvider {
    async fn get_distance(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<RouteDistance, DistanceError> {
        let route = self
            .routes
            .get(&route_key(origin, destination))
            .copied()
            .ok_or_else(|| {
                DistanceError::InvalidResponse(format!("无路线: {} → {}", origin, destination))
            })?;
        validate_route(route)
    }
}

// ==========================================
// GreatCircleDistanceProvider - 大圆距离估算
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct GreatCircleDistanceProvider {
    /// 道路绕行系数（≥ 1）
    pub circuity: f64,
    /// 平均车速（km/h）
    pub average_speed_kmh: f64,
}

impl Default for GreatCircleDistanceProvider {
    fn default() -> Self {
        Self {
            circuity: 1.25,
            average_speed_kmh: 60.0,
        }
    }
}

impl GreatCircleDistanceProvider {
    /// Haversine 大圆距离（km）
    pub fn haversine_km(origin: &Coordinate, destination: &Coordinate) -> f64 {
        let (lat1, lat2) = (origin.lat.to_radians(), destination.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (destination.lon - origin.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[async_trait]
impl DistanceProvider for GreatCircleDistanceProvider {
    async fn get_distance(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<RouteDistance, DistanceError> {
        if self.average_speed_kmh <= 0.0 {
            return Err(DistanceError::InvalidResponse("平均车速必须 > 0".to_string()));
        }
        let distance_km = Self::haversine_km(origin, destination) * self.circuity;
        validate_route(RouteDistance {
            distance_km,
            duration_min: distance_km / self.average_speed_kmh * 60.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timbues() -> Coordinate {
        Coordinate {
            lon: -60.7489,
            lat: -32.6636,
        }
    }

    fn lima() -> Coordinate {
        Coordinate {
            lon: -59.0344,
            lat: -34.1073,
        }
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticDistanceProvider::new().with_route(timbues(), lima(), 230.0, 180.0);
        let route = provider.get_distance(&timbues(), &lima()).await.unwrap();
        assert_eq!(route.distance_km, 230.0);

        // 方向不同视为不同路线
        let missing = provider.get_distance(&lima(), &timbues()).await;
        assert!(matches!(missing, Err(DistanceError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_invalid_route_rejected() {
        let provider = StaticDistanceProvider::new().with_route(timbues(), lima(), -5.0, 10.0);
        assert!(provider.get_distance(&timbues(), &lima()).await.is_err());
    }

    #[tokio::test]
    async fn test_great_circle() {
        let straight = GreatCircleDistanceProvider::haversine_km(&timbues(), &lima());
        // 两港直线距离约 225 km
        assert!(straight > 200.0 && straight < 250.0);

        let provider = GreatCircleDistanceProvider::default();
        let route = provider.get_distance(&timbues(), &lima()).await.unwrap();
        assert!((route.distance_km - straight * 1.25).abs() < 1e-9);
    }
}
