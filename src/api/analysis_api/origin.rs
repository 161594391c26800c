// ==========================================
// 起点比选流程
// ==========================================
// 起点坐标 → 并发获取到两港的陆运距离 → 比选
// 距离服务失败原样返回,不重试、不使用默认距离
// ==========================================

use super::*;
use crate::distance::validate_route;

impl AnalysisApi {
    /// 按起点坐标比选两个港口
    ///
    /// # 错误
    /// - InvalidInput: 坐标越界 / 未配置距离服务 / 成本模型输入非法
    /// - UpstreamFailure: 距离服务失败（原样透传）
    #[instrument(skip(self, shipment), fields(origin = %origin, tonnage = shipment.tonnage_t))]
    pub async fn compare_origin(
        &self,
        origin: &Coordinate,
        shipment: &Shipment,
        destination: Option<&str>,
        region: Option<&str>,
    ) -> ApiResult<OriginComparisonView> {
        origin.validate()?;
        let provider = self
            .distance_provider
            .as_ref()
            .ok_or_else(|| ApiError::InvalidInput("未配置距离服务".to_string()))?;

        // 输入全部校验后再发起外部调用
        let comparator = PortComparator::new(self.cost_model(destination)?);
        let port_a = self.config.port_a.location;
        let port_b = self.config.port_b.location;

        let (route_a, route_b) = futures::try_join!(
            provider.get_distance(origin, &port_a),
            provider.get_distance(origin, &port_b),
        )
        .map_err(|err| {
            tracing::warn!(error = %err, "距离服务失败");
            ApiError::UpstreamFailure(err)
        })?;
        let route_a = validate_route(route_a)?;
        let route_b = validate_route(route_b)?;
        tracing::debug!(
            distance_a_km = route_a.distance_km,
            distance_b_km = route_b.distance_km,
            "距离获取完成"
        );

        let result =
            comparator.compare_in_region(route_a.distance_km, route_b.distance_km, shipment, region)?;

        Ok(OriginComparisonView {
            origin: *origin,
            destination: comparator.model().destination().to_string(),
            route_a,
            route_b,
            comparison: ComparisonView::from(&result),
        })
    }
}
