//! Declarative chart specs.
//!
//! Each binding turns one derived table into a [`ChartSpec`] whose JSON form
//! is a Vega-Lite layer chart. Nothing is rendered here.

use crate::types::{
    CorrelationCell, IndicatorYearTotal, JoinedWideTable, Measure, PercentRow, RateSeries,
    RegionTotal,
};
use crate::util::normalize_column_name;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Fixed color domain of the STD cases map, shared by every year.
pub const STD_CASES_DOMAIN: [f64; 2] = [0.0, 300_000.0];
/// Fixed color domain of the SDH numerator map, shared by every year.
pub const SDH_NUMERATOR_DOMAIN: [f64; 2] = [0.0, 12_000_000.0];
/// Heatmap domain, written high to low to orient the diverging scheme.
pub const CORRELATION_DOMAIN: [f64; 2] = [1.0, -1.0];

pub const MAP_WIDTH: u32 = 600;
pub const MAP_HEIGHT: u32 = 300;
pub const MAP_PROJECTION: &str = "albersUsa";
/// Selection parameter set by clicking a state on the STD map.
pub const STATE_SELECTION: &str = "state_select";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Geoshape,
    Line,
    Bar,
    Rect,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Ordinal,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(u32),
    Step { step: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFormat {
    #[serde(rename = "type")]
    pub kind: String,
    pub feature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataSource {
    Values { values: Vec<Value> },
    Url { url: String, format: DataFormat },
}

impl DataSource {
    pub fn rows(&self) -> &[Value] {
        match self {
            DataSource::Values { values } => values.as_slice(),
            DataSource::Url { .. } => &[],
        }
    }
}

/// Boundary features joined to the choropleth tables by FIPS code.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSource {
    pub url: String,
    pub feature: String,
    /// Feature property holding the FIPS code.
    pub id_field: String,
}

impl GeoSource {
    pub fn topojson<U: Into<String>, F: Into<String>>(url: U, feature: F) -> Self {
        Self { url: url.into(), feature: feature.into(), id_field: "id".to_string() }
    }

    fn data(&self) -> DataSource {
        DataSource::Url {
            url: self.url.clone(),
            format: DataFormat { kind: "topojson".to_string(), feature: self.feature.clone() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MarkDef {
    #[serde(rename = "type")]
    pub mark: Option<Mark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl MarkDef {
    pub fn new(mark: Mark) -> Self {
        Self { mark: Some(mark), ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scale {
    pub domain: Vec<f64>,
    pub scheme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    #[serde(rename = "labelAngle")]
    pub label_angle: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

impl FieldDef {
    pub fn new<S: Into<String>>(field: S, kind: FieldType) -> Self {
        Self { field: field.into(), kind, title: None, scale: None, axis: None }
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn scale(mut self, domain: [f64; 2], scheme: &str) -> Self {
        self.scale = Some(Scale { domain: domain.to_vec(), scheme: scheme.to_string() });
        self
    }

    pub fn label_angle(mut self, angle: i32) -> Self {
        self.axis = Some(Axis { label_angle: angle });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<FieldDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<FieldDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tooltip: Vec<FieldDef>,
}

impl Encoding {
    fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.color.is_none() && self.tooltip.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupFrom {
    pub data: DataSource,
    pub key: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamRef {
    pub param: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transform {
    Lookup { lookup: String, from: LookupFrom },
    Filter { filter: ParamRef },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSelect {
    #[serde(rename = "type")]
    pub kind: String,
    pub on: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionParam {
    pub name: String,
    pub select: PointSelect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub data: DataSource,
    pub mark: MarkDef,
    #[serde(skip_serializing_if = "Encoding::is_empty")]
    pub encoding: Encoding,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Transform>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<SelectionParam>,
}

impl Layer {
    fn new(data: DataSource, mark: MarkDef, encoding: Encoding) -> Self {
        Self { data, mark, encoding, transform: Vec::new(), params: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisConfig {
    #[serde(rename = "labelFontSize")]
    pub label_font_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub axis: AxisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub width: Dimension,
    pub height: Dimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    pub layer: Vec<Layer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ChartConfig>,
}

impl ChartSpec {
    fn new(title: Option<String>, width: Dimension, height: Dimension, layer: Vec<Layer>) -> Self {
        Self {
            schema: "https://vega.github.io/schema/vega-lite/v5.json".to_string(),
            title,
            width,
            height,
            projection: None,
            layer,
            config: None,
        }
    }

    /// Rows bound to the last layer; for maps this is the lookup table.
    pub fn rows(&self) -> &[Value] {
        let Some(layer) = self.layer.last() else {
            return &[];
        };
        for t in &layer.transform {
            if let Transform::Lookup { from, .. } = t {
                return from.data.rows();
            }
        }
        layer.data.rows()
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Color channel settings for one choropleth.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethStyle {
    pub title: String,
    pub domain: [f64; 2],
    pub scheme: &'static str,
    /// Click a state to filter the map down to it.
    pub click_select: bool,
}

fn option_number(v: Option<f64>) -> Value {
    v.map_or(Value::Null, |v| json!(v))
}

/// Choropleth of per-region totals over a gray background of all states.
pub fn choropleth(
    totals: &[RegionTotal],
    measure: Measure,
    geo: &GeoSource,
    style: &ChoroplethStyle,
) -> ChartSpec {
    let field = measure.column();
    let lookup_rows: Vec<Value> = totals
        .iter()
        .map(|t| json!({ "FIPS": t.fips, "Geography": t.geography, field: t.total }))
        .collect();

    let background = Layer::new(
        geo.data(),
        MarkDef {
            fill: Some("#aaa".to_string()),
            stroke: Some("white".to_string()),
            ..MarkDef::new(Mark::Geoshape)
        },
        Encoding::default(),
    );

    let mut values = Layer::new(
        geo.data(),
        MarkDef::new(Mark::Geoshape),
        Encoding {
            color: Some(
                FieldDef::new(field, FieldType::Quantitative).scale(style.domain, style.scheme),
            ),
            tooltip: vec![
                FieldDef::new(field, FieldType::Quantitative),
                FieldDef::new("Geography", FieldType::Nominal),
            ],
            ..Default::default()
        },
    );
    values.transform.push(Transform::Lookup {
        lookup: geo.id_field.clone(),
        from: LookupFrom {
            data: DataSource::Values { values: lookup_rows },
            key: "FIPS".to_string(),
            fields: vec!["Geography".to_string(), field.to_string()],
        },
    });
    if style.click_select {
        values.params.push(SelectionParam {
            name: STATE_SELECTION.to_string(),
            select: PointSelect {
                kind: "point".to_string(),
                on: "click".to_string(),
                fields: vec!["Geography".to_string()],
            },
        });
        values.transform.push(Transform::Filter {
            filter: ParamRef { param: STATE_SELECTION.to_string() },
        });
    }

    let mut spec = ChartSpec::new(
        Some(style.title.clone()),
        Dimension::Pixels(MAP_WIDTH),
        Dimension::Pixels(MAP_HEIGHT),
        vec![background, values],
    );
    spec.projection = Some(Projection { kind: MAP_PROJECTION.to_string() });
    spec
}

pub fn std_cases_map(totals: &[RegionTotal], geo: &GeoSource, year: i32) -> ChartSpec {
    let style = ChoroplethStyle {
        title: format!("STD Cases in U.S. {}", year),
        domain: STD_CASES_DOMAIN,
        scheme: "bluepurple",
        click_select: true,
    };
    choropleth(totals, Measure::Cases, geo, &style)
}

pub fn sdh_numerator_map(totals: &[RegionTotal], geo: &GeoSource, year: i32) -> ChartSpec {
    let style = ChoroplethStyle {
        title: format!("Social Determinants of Health Numerator in U.S. {}", year),
        domain: SDH_NUMERATOR_DOMAIN,
        scheme: "purples",
        click_select: false,
    };
    choropleth(totals, Measure::Numerator, geo, &style)
}

fn year_axis() -> FieldDef {
    FieldDef::new("Year", FieldType::Ordinal).label_angle(0)
}

/// Yearly totals, one line per indicator.
pub fn trend_line(totals: &[IndicatorYearTotal], measure: Measure) -> ChartSpec {
    let field = measure.column();
    let rows = totals
        .iter()
        .map(|t| json!({ "Indicator": t.indicator, "Year": t.year, field: t.total }))
        .collect();
    let encoding = Encoding {
        x: Some(year_axis()),
        y: Some(FieldDef::new(field, FieldType::Quantitative)),
        color: Some(FieldDef::new("Indicator", FieldType::Nominal)),
        tooltip: vec![
            FieldDef::new("Year", FieldType::Ordinal),
            FieldDef::new(field, FieldType::Quantitative),
            FieldDef::new("Indicator", FieldType::Nominal),
        ],
    };
    ChartSpec::new(
        Some(format!("STD {} Trends", field)),
        Dimension::Pixels(800),
        Dimension::Pixels(500),
        vec![Layer::new(DataSource::Values { values: rows }, MarkDef::new(Mark::Line), encoding)],
    )
}

/// Stacked bars of the per-state rate series. Missing cells are left out.
pub fn rate_bar(series: &RateSeries, state: &str) -> ChartSpec {
    let field = Measure::RatePer100000.column();
    let mut rows = Vec::new();
    for row in &series.rows {
        for (indicator, value) in series.columns.iter().zip(&row.values) {
            if let Some(v) = value {
                rows.push(json!({ "Year": row.key, "Indicator": indicator, field: v }));
            }
        }
    }
    let encoding = Encoding {
        x: Some(year_axis()),
        y: Some(FieldDef::new(field, FieldType::Quantitative)),
        color: Some(FieldDef::new("Indicator", FieldType::Nominal)),
        tooltip: vec![
            FieldDef::new("Year", FieldType::Ordinal),
            FieldDef::new("Indicator", FieldType::Nominal),
            FieldDef::new(field, FieldType::Quantitative),
        ],
    };
    ChartSpec::new(
        Some(format!("Yearly Breakdown of STD Rate per 100,000 in {}", state)),
        Dimension::Pixels(800),
        Dimension::Pixels(300),
        vec![Layer::new(DataSource::Values { values: rows }, MarkDef::new(Mark::Bar), encoding)],
    )
}

/// Percent of population per social determinant for one state.
pub fn percent_line(rows: &[PercentRow], state: &str) -> ChartSpec {
    let field = Measure::Percent.column();
    let values = rows
        .iter()
        .map(|r| json!({ "Year": r.year, "Indicator": r.indicator, field: r.percent }))
        .collect();
    let encoding = Encoding {
        x: Some(year_axis()),
        y: Some(FieldDef::new(field, FieldType::Quantitative)),
        color: Some(FieldDef::new("Indicator", FieldType::Nominal)),
        tooltip: vec![
            FieldDef::new("Year", FieldType::Ordinal),
            FieldDef::new(field, FieldType::Quantitative),
            FieldDef::new("Indicator", FieldType::Nominal),
        ],
    };
    ChartSpec::new(
        Some(format!(
            "Yearly Trend of Social Determinants of Health Population Percent in {}",
            state
        )),
        Dimension::Pixels(800),
        Dimension::Pixels(500),
        vec![Layer::new(DataSource::Values { values }, MarkDef::new(Mark::Line), encoding)],
    )
}

/// Heatmap of the melted correlation matrix. Undefined cells carry `null`.
pub fn correlation_heatmap(cells: &[CorrelationCell]) -> ChartSpec {
    let values = cells
        .iter()
        .map(|c| {
            json!({
                "var1": c.var1,
                "var2": c.var2,
                "correlation": option_number(c.correlation),
            })
        })
        .collect();
    let encoding = Encoding {
        x: Some(FieldDef::new("var1", FieldType::Ordinal)),
        y: Some(FieldDef::new("var2", FieldType::Ordinal)),
        color: Some(
            FieldDef::new("correlation", FieldType::Quantitative)
                .scale(CORRELATION_DOMAIN, "pinkyellowgreen"),
        ),
        tooltip: vec![
            FieldDef::new("var1", FieldType::Nominal).title("Variable 1"),
            FieldDef::new("var2", FieldType::Nominal).title("Variable 2"),
            FieldDef::new("correlation", FieldType::Quantitative).title("Correlation"),
        ],
    };
    let mut spec = ChartSpec::new(
        Some("Correlation Heatmap".to_string()),
        Dimension::Step { step: 40 },
        Dimension::Step { step: 40 },
        vec![Layer::new(DataSource::Values { values }, MarkDef::new(Mark::Rect), encoding)],
    );
    spec.config = Some(ChartConfig { axis: AxisConfig { label_font_size: 10 } });
    spec
}

/// Scatter of two indicator columns of the joined table, addressed by their
/// human-readable labels. An unknown label gives an empty chart.
pub fn scatterplot(joined: &JoinedWideTable, x_label: &str, y_label: &str) -> ChartSpec {
    let x_idx = joined.column_index(&normalize_column_name(x_label));
    let y_idx = joined.column_index(&normalize_column_name(y_label));
    let values = match (x_idx, y_idx) {
        (Some(xi), Some(yi)) => joined
            .rows
            .iter()
            .map(|r| {
                let mut obj = Map::new();
                obj.insert(x_label.to_string(), option_number(r.values[xi]));
                obj.insert(y_label.to_string(), option_number(r.values[yi]));
                Value::Object(obj)
            })
            .collect(),
        _ => {
            log::debug!("Scatterplot columns not found: {} / {}", x_label, y_label);
            Vec::new()
        }
    };
    let encoding = Encoding {
        x: Some(FieldDef::new(x_label, FieldType::Quantitative).title(x_label)),
        y: Some(FieldDef::new(y_label, FieldType::Quantitative).title(y_label)),
        color: None,
        tooltip: vec![
            FieldDef::new(x_label, FieldType::Quantitative),
            FieldDef::new(y_label, FieldType::Quantitative),
        ],
    };
    let mark = MarkDef {
        color: Some("pink".to_string()),
        size: Some(60),
        ..MarkDef::new(Mark::Circle)
    };
    ChartSpec::new(
        Some(format!("{} vs {}", x_label, y_label)),
        Dimension::Pixels(450),
        Dimension::Pixels(400),
        vec![Layer::new(DataSource::Values { values }, mark, encoding)],
    )
}
