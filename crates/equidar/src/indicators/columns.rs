use super::domain::MetricValues;
use super::SchemaError;
use csv::StringRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// Header lookup rule: the canonical name matches exactly, fallbacks match
/// ignoring ASCII case.
#[derive(Debug, Clone, Copy)]
struct ColumnSpec {
    canonical: &'static str,
    fallbacks: &'static [&'static str],
}

const SCHOOL_ID: ColumnSpec = ColumnSpec {
    canonical: "ID_ESCOLA",
    fallbacks: &["ID_ESCOLA", "CO_ENTIDADE"],
};
const SCHOOL_NAME: ColumnSpec = ColumnSpec {
    canonical: "NO_ESCOLA",
    fallbacks: &["NO_ESCOLA", "NO_ENTIDADE"],
};
const MUNICIPALITY: ColumnSpec = ColumnSpec {
    canonical: "NO_MUNICIPIO",
    fallbacks: &["NO_MUNICIPIO"],
};
const MUNICIPALITY_CODE: ColumnSpec = ColumnSpec {
    canonical: "CO_MUNICIPIO",
    fallbacks: &["CO_MUNICIPIO"],
};
const STATE: ColumnSpec = ColumnSpec {
    canonical: "SG_UF",
    fallbacks: &["SG_UF"],
};
const NETWORK: ColumnSpec = ColumnSpec {
    canonical: "REDE",
    fallbacks: &["REDE", "TP_REDE"],
};
const YEAR_ALIASES: [ColumnSpec; 3] = [
    ColumnSpec {
        canonical: "AN_REFERENCIA",
        fallbacks: &["AN_REFERENCIA"],
    },
    ColumnSpec {
        canonical: "ANO",
        fallbacks: &["ANO"],
    },
    ColumnSpec {
        canonical: "NU_ANO",
        fallbacks: &["NU_ANO"],
    },
];

impl ColumnSpec {
    fn resolve(&self, headers: &StringRecord) -> Option<usize> {
        headers
            .iter()
            .position(|header| header == self.canonical)
            .or_else(|| {
                headers.iter().position(|header| {
                    self.fallbacks
                        .iter()
                        .any(|alias| header.eq_ignore_ascii_case(alias))
                })
            })
    }

    fn require(&self, headers: &StringRecord) -> Result<usize, SchemaError> {
        self.resolve(headers).ok_or(SchemaError::MissingColumn {
            column: self.canonical,
        })
    }
}

/// Metric fields carried by every export, named by their column prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum MetricColumn {
    ApprovalRate,
    MathScore,
    LanguageScore,
    MeanScore,
    CompositeIndex,
    CompositeProjection,
}

impl MetricColumn {
    const fn all() -> [Self; 6] {
        [
            Self::ApprovalRate,
            Self::MathScore,
            Self::LanguageScore,
            Self::MeanScore,
            Self::CompositeIndex,
            Self::CompositeProjection,
        ]
    }

    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::ApprovalRate => "VL_INDICADOR_REND",
            Self::MathScore => "VL_NOTA_MATEMATICA",
            Self::LanguageScore => "VL_NOTA_PORTUGUES",
            Self::MeanScore => "VL_NOTA_MEDIA",
            Self::CompositeIndex => "VL_OBSERVADO",
            Self::CompositeProjection => "VL_PROJECAO",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|metric| metric.name() == name)
            .or_else(|| {
                Self::all()
                    .into_iter()
                    .find(|metric| metric.name().eq_ignore_ascii_case(name))
            })
    }

    pub(crate) fn assign(self, metrics: &mut MetricValues, value: Option<f64>) {
        let slot = match self {
            Self::ApprovalRate => &mut metrics.approval_rate,
            Self::MathScore => &mut metrics.math_score,
            Self::LanguageScore => &mut metrics.language_score,
            Self::MeanScore => &mut metrics.mean_score,
            Self::CompositeIndex => &mut metrics.composite_index,
            Self::CompositeProjection => &mut metrics.composite_projection,
        };
        *slot = value;
    }
}

/// Splits `VL_OBSERVADO_2019` into its metric and year.
fn year_suffixed_metric(header: &str) -> Option<(MetricColumn, i32)> {
    let (prefix, suffix) = header.trim().rsplit_once('_')?;
    if suffix.len() != 4 || !suffix.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let metric = MetricColumn::from_name(prefix)?;
    let year = suffix.parse().ok()?;
    Some((metric, year))
}

/// Which of the two recognized export shapes a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// One column per (metric, year); unpivoted at load time.
    Wide,
    /// One row per year with an explicit year column.
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MetricCell {
    pub(crate) index: usize,
    pub(crate) metric: MetricColumn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SourceLayout {
    Wide {
        /// Ordered year slots with the metric cells for each year.
        years: Vec<(i32, Vec<MetricCell>)>,
    },
    Long {
        year: usize,
        metrics: Vec<MetricCell>,
    },
}

impl SourceLayout {
    pub(crate) fn kind(&self) -> LayoutKind {
        match self {
            SourceLayout::Wide { .. } => LayoutKind::Wide,
            SourceLayout::Long { .. } => LayoutKind::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IdentityColumns {
    pub(crate) school_id: usize,
    pub(crate) school_name: usize,
    pub(crate) municipality: usize,
    pub(crate) municipality_code: Option<usize>,
    pub(crate) state: Option<usize>,
    pub(crate) network: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnPlan {
    pub(crate) identity: IdentityColumns,
    pub(crate) layout: SourceLayout,
}

/// Picks the layout strategy from the header row alone.
pub(crate) fn plan(headers: &StringRecord) -> Result<ColumnPlan, SchemaError> {
    let layout = detect_layout(headers)?;
    let identity = IdentityColumns {
        school_id: SCHOOL_ID.require(headers)?,
        school_name: SCHOOL_NAME.require(headers)?,
        municipality: MUNICIPALITY.require(headers)?,
        municipality_code: MUNICIPALITY_CODE.resolve(headers),
        state: STATE.resolve(headers),
        network: NETWORK.resolve(headers),
    };

    Ok(ColumnPlan { identity, layout })
}

fn detect_layout(headers: &StringRecord) -> Result<SourceLayout, SchemaError> {
    let suffixed: Vec<(i32, MetricCell)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            year_suffixed_metric(header).map(|(metric, year)| (year, MetricCell { index, metric }))
        })
        .collect();

    if !suffixed.is_empty() {
        let years: BTreeSet<i32> = suffixed.iter().map(|(year, _)| *year).collect();
        let years = years
            .into_iter()
            .map(|year| {
                let cells = suffixed
                    .iter()
                    .filter(|(cell_year, _)| *cell_year == year)
                    .map(|(_, cell)| *cell)
                    .collect();
                (year, cells)
            })
            .collect();
        return Ok(SourceLayout::Wide { years });
    }

    let year = YEAR_ALIASES
        .iter()
        .find_map(|spec| spec.resolve(headers))
        .ok_or_else(|| SchemaError::UnrecognizedLayout {
            columns: headers.iter().map(str::to_string).collect(),
        })?;

    let mut metrics: Vec<MetricCell> = Vec::new();
    for metric in MetricColumn::all() {
        let exact = headers.iter().position(|header| header == metric.name());
        let index = exact.or_else(|| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(metric.name()))
        });
        if let Some(index) = index {
            metrics.push(MetricCell { index, metric });
        }
    }

    if metrics.is_empty() {
        return Err(SchemaError::NoMetricColumns);
    }

    Ok(SourceLayout::Long { year, metrics })
}
