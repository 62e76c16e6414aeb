use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use contracts::dashboards::d400_monotributo::{AlertState, BillingSnapshot};
use contracts::domain::a001_payment::{PaymentId, PaymentRecord};
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::domain::a003_user_config::{UserConfig, UserConfigDto, UserConfigId};
use contracts::domain::common::{EntityMetadata, Origin};
use contracts::enums::ActivityType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::shared::data::source::{DataAccessError, MonotributoDataSource};

const TABLE_SNAPSHOT: &str = "facturacion_snapshot";
const TABLE_PAYMENTS: &str = "pagos";
const TABLE_CONFIG: &str = "configuracion_usuario";
const TABLE_CATEGORIES: &str = "categorias_monotributo";

/// HTTP-клиент для авто-сгенерированного REST API внешней базы (PostgREST)
pub struct HostedApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HostedApiClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("API key is required for the hosted backend");
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    async fn read_rows<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        table: &str,
    ) -> Result<Vec<T>, DataAccessError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Hosted API request to {} failed: {} {}", table, status, body);
            return Err(DataAccessError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let preview: String = body.chars().take(300).collect();
        tracing::debug!("Hosted API {} response preview: {}", table, preview);

        serde_json::from_str::<Vec<T>>(&body).map_err(|e| {
            tracing::error!("Failed to parse hosted API response for {}: {}", table, e);
            DataAccessError::Decode(format!("{}: {}", table, e))
        })
    }

    /// GET /rest/v1/<table>?<query>
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DataAccessError> {
        let response = self
            .request(reqwest::Method::GET, &self.table_url(table))
            .query(query)
            .send()
            .await?;
        self.read_rows(response, table).await
    }

    /// POST /rest/v1/<table>, возвращает вставленные строки
    pub async fn insert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, DataAccessError> {
        let response = self
            .request(reqwest::Method::POST, &self.table_url(table))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        self.read_rows(response, table).await
    }

    /// PATCH /rest/v1/<table>?id=eq.<id>, возвращает измененные строки
    pub async fn update_by_id<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> Result<Vec<T>, DataAccessError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(id)
        );
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        self.read_rows(response, table).await
    }
}

// ============================================================================
// Строки внешней базы
// ============================================================================

/// Ключ внешней базы: uuid строкой или bigint числом
fn id_to_string(value: &serde_json::Value) -> Result<String, DataAccessError> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(DataAccessError::Decode(format!("unsupported id: {}", other))),
    }
}

fn percentage(value: Option<f64>) -> u32 {
    value.unwrap_or(0.0).round().clamp(0.0, 100_000.0) as u32
}

#[derive(Debug, Deserialize)]
struct PagoRow {
    id: serde_json::Value,
    fecha: NaiveDate,
    monto: f64,
    #[serde(default)]
    facturado: bool,
    #[serde(default)]
    descripcion: Option<String>,
}

impl PagoRow {
    fn into_domain(self) -> Result<PaymentRecord, DataAccessError> {
        Ok(PaymentRecord {
            id: PaymentId(id_to_string(&self.id)?),
            date: self.fecha,
            amount: self.monto,
            invoiced: self.facturado,
            description: self.descripcion,
            metadata: EntityMetadata::default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CategoriaRow {
    categoria: String,
    ingresos_brutos: f64,
    cuota_servicios: f64,
    cuota_venta: f64,
    #[serde(default)]
    descripcion: Option<String>,
    #[serde(default)]
    fecha_hasta: Option<NaiveDate>,
}

impl From<CategoriaRow> for TaxCategory {
    fn from(row: CategoriaRow) -> Self {
        let description = row
            .descripcion
            .unwrap_or_else(|| format!("Categoría {}", row.categoria));
        TaxCategory {
            code: row.categoria,
            annual_limit: row.ingresos_brutos,
            monthly_fee_services: row.cuota_servicios,
            monthly_fee_commerce: row.cuota_venta,
            description,
            valid_until: row.fecha_hasta,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfiguracionRow {
    id: serde_json::Value,
    categoria_actual: String,
    #[serde(default)]
    tipo_actividad: Option<String>,
    #[serde(default)]
    porcentaje_objetivo_facturacion: Option<f64>,
    #[serde(default)]
    fecha_alta: Option<NaiveDate>,
    #[serde(default)]
    notas: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl ConfiguracionRow {
    fn into_domain(self) -> Result<UserConfig, DataAccessError> {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ok(UserConfig {
            id: UserConfigId(id_to_string(&self.id)?),
            current_category: self.categoria_actual,
            activity_type: self
                .tipo_actividad
                .as_deref()
                .and_then(ActivityType::from_code)
                .unwrap_or_default(),
            target_invoicing_percentage: percentage(self.porcentaje_objetivo_facturacion)
                .min(100),
            registration_date: self.fecha_alta,
            notes: self.notas,
            metadata: EntityMetadata {
                created_at,
                updated_at: self.updated_at.unwrap_or(created_at),
                is_deleted: false,
                version: 0,
            },
        })
    }
}

/// Поля настройки, которые клиент отправляет в базу
#[derive(Debug, Serialize)]
struct ConfiguracionWrite<'a> {
    categoria_actual: &'a str,
    tipo_actividad: &'a str,
    porcentaje_objetivo_facturacion: u32,
    fecha_alta: Option<NaiveDate>,
    notas: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a UserConfig> for ConfiguracionWrite<'a> {
    fn from(c: &'a UserConfig) -> Self {
        Self {
            categoria_actual: &c.current_category,
            tipo_actividad: c.activity_type.code(),
            porcentaje_objetivo_facturacion: c.target_invoicing_percentage,
            fecha_alta: c.registration_date,
            notas: c.notes.as_deref(),
            updated_at: c.metadata.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(default)]
    categoria_actual: Option<String>,
    #[serde(default)]
    total_cobrado_periodo: Option<f64>,
    #[serde(default)]
    total_facturado_periodo: Option<f64>,
    #[serde(default)]
    porcentaje_facturado_periodo: Option<f64>,
    #[serde(default)]
    porcentaje_objetivo: Option<f64>,
    #[serde(default)]
    estado_alerta: Option<String>,
    inicio_periodo: NaiveDate,
    fin_periodo: NaiveDate,
    #[serde(default)]
    dias_hasta_recategorizacion: Option<i64>,
    proxima_recategorizacion: NaiveDate,
    #[serde(default)]
    margen_disponible: Option<f64>,
    #[serde(default)]
    limite_anual: Option<f64>,
    #[serde(default)]
    porcentaje_utilizacion_limite: Option<f64>,
    #[serde(default)]
    proyeccion_anual: Option<f64>,
}

impl From<SnapshotRow> for BillingSnapshot {
    fn from(row: SnapshotRow) -> Self {
        BillingSnapshot {
            current_category: row.categoria_actual.unwrap_or_default(),
            period_total_received: row.total_cobrado_periodo.unwrap_or(0.0),
            period_total_invoiced: row.total_facturado_periodo.unwrap_or(0.0),
            period_invoiced_percentage: percentage(row.porcentaje_facturado_periodo),
            target_invoicing_percentage: percentage(row.porcentaje_objetivo).min(100),
            alert_state: row
                .estado_alerta
                .as_deref()
                .map(AlertState::from_tag)
                .unwrap_or(AlertState::Ok),
            period_start: row.inicio_periodo,
            period_end: row.fin_periodo,
            days_until_recategorization: row
                .dias_hasta_recategorizacion
                .unwrap_or_else(|| (row.proxima_recategorizacion - row.fin_periodo).num_days()),
            next_recategorization_date: row.proxima_recategorizacion,
            available_margin: row.margen_disponible.unwrap_or(0.0),
            annual_limit: row.limite_anual.unwrap_or(0.0),
            limit_utilization_percentage: percentage(row.porcentaje_utilizacion_limite),
            annual_projection: row.proyeccion_anual,
        }
    }
}

// ============================================================================
// Источник данных
// ============================================================================

/// Источник данных поверх внешнего BaaS
pub struct HostedDataSource {
    api: HostedApiClient,
}

impl HostedDataSource {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        Ok(Self {
            api: HostedApiClient::new(base_url, api_key)?,
        })
    }

    async fn latest_config_row(&self) -> Result<Option<ConfiguracionRow>, DataAccessError> {
        let rows: Vec<ConfiguracionRow> = self
            .api
            .select(
                TABLE_CONFIG,
                &[
                    ("select", "*".to_string()),
                    ("order", "updated_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// Как записать настройку во внешнюю базу
#[derive(Debug)]
enum ConfigWrite {
    /// PATCH последней записи по ее ключу
    Update(UserConfig),
    /// POST новой записи, ключ назначает база
    Insert(UserConfig),
}

/// Слить присланные поля с последней записью, если она есть
fn plan_config_write(
    latest: Option<ConfiguracionRow>,
    dto: &UserConfigDto,
) -> Result<ConfigWrite, DataAccessError> {
    let (mut config, is_update) = match latest {
        Some(row) => {
            let mut config = row.into_domain()?;
            config.update(dto);
            (config, true)
        }
        None => (UserConfig::new_for_insert(dto), false),
    };
    config.validate(&[]).map_err(DataAccessError::Validation)?;
    config.before_write();
    Ok(if is_update {
        ConfigWrite::Update(config)
    } else {
        ConfigWrite::Insert(config)
    })
}

fn first_written(rows: Vec<ConfiguracionRow>) -> Result<UserConfig, DataAccessError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DataAccessError::Decode("write returned no rows".into()))?
        .into_domain()
}

#[async_trait]
impl MonotributoDataSource for HostedDataSource {
    fn origin(&self) -> Origin {
        Origin::Hosted
    }

    async fn get_billing_snapshot(&self) -> Result<Option<BillingSnapshot>, DataAccessError> {
        let rows: Vec<SnapshotRow> = self
            .api
            .select(
                TABLE_SNAPSHOT,
                &[("select", "*".to_string()), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn get_payments_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<PaymentRecord>, DataAccessError> {
        let rows: Vec<PagoRow> = self
            .api
            .select(
                TABLE_PAYMENTS,
                &[
                    ("select", "id,fecha,monto,facturado,descripcion".to_string()),
                    ("eliminado", "eq.false".to_string()),
                    ("fecha", format!("gte.{}", since.format("%Y-%m-%d"))),
                    ("order", "fecha.asc".to_string()),
                ],
            )
            .await?;
        rows.into_iter().map(PagoRow::into_domain).collect()
    }

    async fn get_user_config(&self) -> Result<Option<UserConfig>, DataAccessError> {
        self.latest_config_row()
            .await?
            .map(ConfiguracionRow::into_domain)
            .transpose()
    }

    async fn get_tax_categories(&self) -> Result<Vec<TaxCategory>, DataAccessError> {
        let rows: Vec<CategoriaRow> = self
            .api
            .select(
                TABLE_CATEGORIES,
                &[
                    ("select", "*".to_string()),
                    ("fecha_hasta", "is.null".to_string()),
                    ("order", "categoria.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_user_config(
        &self,
        dto: UserConfigDto,
    ) -> Result<UserConfig, DataAccessError> {
        let latest = self.latest_config_row().await?;
        let rows: Vec<ConfiguracionRow> = match plan_config_write(latest, &dto)? {
            ConfigWrite::Update(config) => {
                self.api
                    .update_by_id(TABLE_CONFIG, &config.id.0, &ConfiguracionWrite::from(&config))
                    .await?
            }
            ConfigWrite::Insert(config) => {
                self.api
                    .insert(TABLE_CONFIG, &ConfiguracionWrite::from(&config))
                    .await?
            }
        };
        first_written(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_row_accepts_numeric_id() {
        let rows: Vec<PagoRow> = serde_json::from_str(
            r#"[{"id": 17, "fecha": "2024-01-05", "monto": 1000.5, "facturado": true}]"#,
        )
        .unwrap();
        let payment = rows.into_iter().next().unwrap().into_domain().unwrap();
        assert_eq!(payment.id.0, "17");
        assert_eq!(payment.amount, 1000.5);
        assert!(payment.invoiced);
        assert_eq!(payment.month_key(), "2024-01");
    }

    #[test]
    fn test_config_row_maps_spanish_activity_and_timestamps() {
        let rows: Vec<ConfiguracionRow> = serde_json::from_str(
            r#"[{
                "id": "9b2f",
                "categoria_actual": "C",
                "tipo_actividad": "comercio",
                "porcentaje_objetivo_facturacion": 85,
                "fecha_alta": "2022-03-01",
                "notas": null,
                "created_at": "2024-01-01T10:00:00+00:00",
                "updated_at": "2024-05-02T08:30:00.250+00:00"
            }]"#,
        )
        .unwrap();
        let config = rows.into_iter().next().unwrap().into_domain().unwrap();
        assert_eq!(config.id.0, "9b2f");
        assert_eq!(config.activity_type, ActivityType::Commerce);
        assert_eq!(config.target_invoicing_percentage, 85);
        assert_eq!(config.registration_date, NaiveDate::from_ymd_opt(2022, 3, 1));
        assert!(config.last_updated() > config.metadata.created_at);
    }

    #[test]
    fn test_snapshot_row_maps_alert_tag() {
        let rows: Vec<SnapshotRow> = serde_json::from_str(
            r#"[{
                "categoria_actual": "B",
                "total_cobrado_periodo": 3000000,
                "total_facturado_periodo": 2400000,
                "porcentaje_facturado_periodo": 80,
                "porcentaje_objetivo": 90,
                "estado_alerta": "BELOW_INVOICING_TARGET",
                "inicio_periodo": "2023-07-01",
                "fin_periodo": "2024-06-15",
                "proxima_recategorizacion": "2024-07-20",
                "limite_anual": 9450000,
                "proyeccion_anual": null
            }]"#,
        )
        .unwrap();
        let snapshot: BillingSnapshot = rows.into_iter().next().unwrap().into();
        assert_eq!(snapshot.alert_state, AlertState::BelowInvoicingTarget);
        assert_eq!(snapshot.days_until_recategorization, 35);
        assert_eq!(snapshot.annual_projection, None);
        assert_eq!(snapshot.available_margin, 0.0);
    }

    #[test]
    fn test_write_body_uses_column_names() {
        let config = UserConfig::new_for_insert(&UserConfigDto {
            current_category: Some("B".into()),
            target_invoicing_percentage: Some(80),
            ..Default::default()
        });
        let body = serde_json::to_value(ConfiguracionWrite::from(&config)).unwrap();
        assert_eq!(body["categoria_actual"], "B");
        assert_eq!(body["tipo_actividad"], "services");
        assert_eq!(body["porcentaje_objetivo_facturacion"], 80);
        assert!(body.get("id").is_none());
    }

    fn config_row(updated_at: &str) -> ConfiguracionRow {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "categoria_actual": "C",
            "tipo_actividad": "servicios",
            "porcentaje_objetivo_facturacion": 60,
            "created_at": "2024-01-01T10:00:00+00:00",
            "updated_at": updated_at
        }))
        .unwrap()
    }

    #[test]
    fn test_write_plan_patches_latest_row() {
        let dto = UserConfigDto {
            target_invoicing_percentage: Some(90),
            ..Default::default()
        };
        let row = config_row("2024-05-02T08:30:00+00:00");
        let previous_update = row.updated_at.unwrap();

        let ConfigWrite::Update(config) = plan_config_write(Some(row), &dto).unwrap() else {
            panic!("expected an update of the latest row");
        };
        assert_eq!(config.id.0, "42");
        assert_eq!(config.current_category, "C");
        assert_eq!(config.target_invoicing_percentage, 90);
        assert!(config.last_updated() > previous_update);

        // повторная запись поверх записанного сохраняет ключ
        let written: ConfiguracionRow = serde_json::from_value(serde_json::json!({
            "id": 42,
            "categoria_actual": config.current_category.clone(),
            "porcentaje_objetivo_facturacion": config.target_invoicing_percentage,
            "updated_at": config.last_updated()
        }))
        .unwrap();
        let ConfigWrite::Update(again) = plan_config_write(Some(written), &dto).unwrap() else {
            panic!("expected an update of the latest row");
        };
        assert_eq!(again.id, config.id);
        assert!(again.last_updated() > config.last_updated());
    }

    #[test]
    fn test_write_plan_inserts_when_empty() {
        let dto = UserConfigDto {
            target_invoicing_percentage: Some(80),
            ..Default::default()
        };
        let ConfigWrite::Insert(config) = plan_config_write(None, &dto).unwrap() else {
            panic!("expected an insert into the empty table");
        };
        assert_eq!(config.target_invoicing_percentage, 80);
        assert_eq!(config.current_category, "A");

        let body = serde_json::to_value(ConfiguracionWrite::from(&config)).unwrap();
        assert!(body.get("id").is_none());
    }

    #[test]
    fn test_write_plan_rejects_blank_category() {
        let dto = UserConfigDto {
            current_category: Some("  ".into()),
            ..Default::default()
        };
        let err = plan_config_write(None, &dto).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_first_written_requires_a_row() {
        let err = first_written(Vec::new()).unwrap_err();
        assert!(matches!(err, DataAccessError::Decode(_)));

        let config = first_written(vec![config_row("2024-05-02T08:30:00+00:00")]).unwrap();
        assert_eq!(config.id.0, "42");
        assert_eq!(config.activity_type, ActivityType::Services);
    }

    #[test]
    fn test_client_requires_api_key() {
        assert!(HostedApiClient::new("https://demo.example.com/", " ").is_err());
        let client = HostedApiClient::new("https://demo.example.com/", "anon").unwrap();
        assert_eq!(
            client.table_url(TABLE_PAYMENTS),
            "https://demo.example.com/rest/v1/pagos"
        );
    }
}
