//! Recommendation synthesis.
//!
//! Every known criterion has a fixed, ordered rule set per status band.
//! Compound rules look at two or more criteria at once; when one fires it
//! replaces the specific single-criterion clauses it covers, and the rest
//! still apply.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use suitability_map_criteria_models::{Criterion, Priority, Recommendation, Status};

/// Identifies a single-criterion rule so compound rules can suppress it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    // Air quality
    MaintainAirStandards,
    MonitorPollutionSources,
    CleanTransport,
    MonitoringStations,
    RoadsideGreenBuffers,
    PeakTrafficLimits,
    EmissionControls,
    RelocateSensitiveFacilities,
    IndustrialPollutionControls,
    GreenCorridors,
    // Heat & greenspace
    MaintainGreenInfrastructure,
    TreeCanopy,
    GreenRoofs,
    ShadeAndCoolPavements,
    CommunityGardens,
    TreePlanting,
    WaterFeatures,
    NewGreenSpace,
    GreenBuildingStandards,
    // Infrastructure
    MaintainServiceLevels,
    UpgradeSecondaryInfrastructure,
    RoadConnectivity,
    HealthcareFacilities,
    PublicTransport,
    UrgentInfrastructure,
    RoadsAndUtilities,
    EssentialServices,
    Telecommunications,
    // Economic activity
    MaintainEconomicVitality,
    ActivityCapacity,
    LocalBusiness,
    CommercialInfrastructure,
    BusinessInvestment,
    CommercialZones,
    Accessibility,
    DevelopmentIncentives,
    BusinessDistricts,
    EconomicConnectivity,
    // Population
    SustainableDensity,
    MatchGrowth,
    GradualGrowth,
    ExistingServices,
    DensityReview,
    InfrastructureFirst,
    CommunityServices,
    // Topography
    SuitableTerrain,
    SlopeStabilization,
    SlopePlanning,
    Drainage,
    SteepTerrain,
    Terracing,
    HigherCosts,
    AlternativeSites,
}

/// One band-driven recommendation for a single criterion.
#[derive(Debug, Clone, Copy)]
pub struct SingleRule {
    /// Name used for suppression.
    pub clause: Clause,
    /// Recommendation text.
    pub text: &'static str,
}

macro_rules! rule {
    ($clause:ident, $text:expr $(,)?) => {
        SingleRule {
            clause: Clause::$clause,
            text: $text,
        }
    };
}

/// Rules for a criterion in a band, in output order.
///
/// Unregistered criteria have no rules.
#[must_use]
pub fn single_rules(criterion: &Criterion, status: Status) -> &'static [SingleRule] {
    match (criterion, status) {
        (Criterion::AirQuality, Status::Excellent) => &[rule!(
            MaintainAirStandards,
            "Maintain current air quality standards",
        )],
        (Criterion::AirQuality, Status::Good) => &[
            rule!(MonitorPollutionSources, "Monitor pollution sources"),
            rule!(CleanTransport, "Promote clean transportation"),
        ],
        (Criterion::AirQuality, Status::Moderate) => &[
            rule!(MonitoringStations, "Install air quality monitoring stations"),
            rule!(RoadsideGreenBuffers, "Create green buffers along roads"),
            rule!(PeakTrafficLimits, "Restrict heavy traffic during peak hours"),
        ],
        (Criterion::AirQuality, Status::Poor) => &[
            rule!(EmissionControls, "Urgent need for emission controls"),
            rule!(
                RelocateSensitiveFacilities,
                "Relocate sensitive facilities (schools, hospitals)",
            ),
            rule!(
                IndustrialPollutionControls,
                "Implement industrial pollution controls",
            ),
            rule!(GreenCorridors, "Create extensive green corridors"),
        ],

        (Criterion::HeatGreenspace, Status::Excellent) => &[rule!(
            MaintainGreenInfrastructure,
            "Maintain current green infrastructure",
        )],
        (Criterion::HeatGreenspace, Status::Good) => &[
            rule!(TreeCanopy, "Increase tree canopy coverage"),
            rule!(GreenRoofs, "Add green roofs"),
        ],
        (Criterion::HeatGreenspace, Status::Moderate) => &[
            rule!(ShadeAndCoolPavements, "Install shade structures and cool pavements"),
            rule!(TreeCanopy, "Increase tree canopy coverage"),
            rule!(CommunityGardens, "Create community gardens"),
        ],
        (Criterion::HeatGreenspace, Status::Poor) => &[
            rule!(TreePlanting, "Urgent tree planting program"),
            rule!(ShadeAndCoolPavements, "Install shade structures and cool pavements"),
            rule!(WaterFeatures, "Create water features for cooling"),
            rule!(NewGreenSpace, "Establish new parks and green spaces"),
            rule!(
                GreenBuildingStandards,
                "Implement mandatory green building standards",
            ),
        ],

        (Criterion::Infrastructure, Status::Excellent) => {
            &[rule!(MaintainServiceLevels, "Maintain current service levels")]
        }
        (Criterion::Infrastructure, Status::Good) => &[rule!(
            UpgradeSecondaryInfrastructure,
            "Upgrade secondary infrastructure",
        )],
        (Criterion::Infrastructure, Status::Moderate) => &[
            rule!(RoadConnectivity, "Improve road connectivity"),
            rule!(HealthcareFacilities, "Add healthcare facilities"),
            rule!(PublicTransport, "Enhance public transportation"),
        ],
        (Criterion::Infrastructure, Status::Poor) => &[
            rule!(UrgentInfrastructure, "Urgent infrastructure development needed"),
            rule!(RoadsAndUtilities, "Build new roads and utilities"),
            rule!(
                EssentialServices,
                "Establish essential services (hospital, school)",
            ),
            rule!(Telecommunications, "Install telecommunications infrastructure"),
        ],

        (Criterion::EconomicActivity, Status::Excellent) => &[
            rule!(MaintainEconomicVitality, "Maintain economic vitality"),
            rule!(
                ActivityCapacity,
                "Ensure infrastructure can handle activity levels",
            ),
        ],
        (Criterion::EconomicActivity, Status::Good) => &[
            rule!(LocalBusiness, "Support local business development"),
            rule!(CommercialInfrastructure, "Improve commercial infrastructure"),
        ],
        (Criterion::EconomicActivity, Status::Moderate) => &[
            rule!(BusinessInvestment, "Encourage business investment"),
            rule!(CommercialZones, "Develop commercial zones"),
            rule!(Accessibility, "Improve accessibility"),
        ],
        (Criterion::EconomicActivity, Status::Poor) => &[
            rule!(DevelopmentIncentives, "Create economic development incentives"),
            rule!(BusinessDistricts, "Establish business districts"),
            rule!(
                EconomicConnectivity,
                "Improve connectivity to economic centers",
            ),
        ],

        (Criterion::Population, Status::Excellent) => &[
            rule!(SustainableDensity, "Suitable for sustainable development"),
            rule!(MatchGrowth, "Plan infrastructure to match growth"),
        ],
        (Criterion::Population, Status::Good) => &[
            rule!(MatchGrowth, "Plan infrastructure to match growth"),
            rule!(GradualGrowth, "Plan for gradual population growth"),
        ],
        (Criterion::Population, Status::Moderate) => &[
            rule!(GradualGrowth, "Plan for gradual population growth"),
            rule!(
                ExistingServices,
                "Improve public services for existing population",
            ),
        ],
        (Criterion::Population, Status::Poor) => &[
            rule!(
                DensityReview,
                "Density is far from sustainable levels - review before further development",
            ),
            rule!(
                InfrastructureFirst,
                "Ensure infrastructure before development",
            ),
            rule!(CommunityServices, "Establish community services"),
        ],

        (Criterion::Topography, Status::Excellent) => {
            &[rule!(SuitableTerrain, "Suitable terrain for development")]
        }
        (Criterion::Topography, Status::Good) => &[rule!(
            SlopeStabilization,
            "Standard slope stabilization needed",
        )],
        (Criterion::Topography, Status::Moderate) => &[
            rule!(
                SlopePlanning,
                "Moderate slopes - manageable with proper planning",
            ),
            rule!(SlopeStabilization, "Standard slope stabilization needed"),
            rule!(Drainage, "Check for drainage issues"),
        ],
        (Criterion::Topography, Status::Poor) => &[
            rule!(SteepTerrain, "Steep terrain - requires careful engineering"),
            rule!(Terracing, "Consider terracing for development"),
            rule!(HigherCosts, "Higher construction costs expected"),
            rule!(
                AlternativeSites,
                "Consider alternative locations for major development",
            ),
        ],

        (Criterion::Unregistered(_), _) => &[],
    }
}

/// Priority of single-criterion rules in a band.
#[must_use]
pub const fn band_priority(status: Status) -> Priority {
    match status {
        Status::Poor => Priority::Urgent,
        Status::Moderate | Status::Good => Priority::Standard,
        Status::Excellent => Priority::Maintain,
    }
}

/// A rule that fires when every listed criterion is in one of its bands.
#[derive(Debug)]
pub struct CompoundRule {
    /// `(criterion, accepted statuses)` pairs that must all hold.
    pub requires: &'static [(Criterion, &'static [Status])],
    /// Priority of the produced recommendation.
    pub priority: Priority,
    /// Recommendation text.
    pub text: &'static str,
    /// Single-criterion clauses this rule replaces.
    pub suppresses: &'static [(Criterion, Clause)],
}

impl CompoundRule {
    fn matches(&self, statuses: &BTreeMap<Criterion, Status>) -> bool {
        self.requires.iter().all(|(criterion, accepted)| {
            statuses
                .get(criterion)
                .is_some_and(|status| accepted.contains(status))
        })
    }

    fn suppresses(&self, criterion: &Criterion, clause: Clause) -> bool {
        self.suppresses
            .iter()
            .any(|(c, s)| c == criterion && *s == clause)
    }

    fn recommendation(&self) -> Recommendation {
        Recommendation {
            text: self.text.to_string(),
            priority: self.priority,
            criteria: self.requires.iter().map(|(c, _)| c.clone()).collect(),
        }
    }
}

const POOR: &[Status] = &[Status::Poor];
const GOOD_OR_BETTER: &[Status] = &[Status::Excellent, Status::Good];
const MODERATE_OR_WORSE: &[Status] = &[Status::Moderate, Status::Poor];

/// Cross-criterion rules, in output order.
pub const COMPOUND_RULES: &[CompoundRule] = &[
    CompoundRule {
        requires: &[
            (Criterion::AirQuality, POOR),
            (Criterion::HeatGreenspace, POOR),
        ],
        priority: Priority::Urgent,
        text: "Plant dense green corridors to filter air pollution and cool the area",
        suppresses: &[
            (Criterion::AirQuality, Clause::GreenCorridors),
            (Criterion::HeatGreenspace, Clause::TreePlanting),
            (Criterion::HeatGreenspace, Clause::NewGreenSpace),
        ],
    },
    CompoundRule {
        requires: &[
            (Criterion::Infrastructure, POOR),
            (Criterion::Population, POOR),
        ],
        priority: Priority::Urgent,
        text: "Establish essential services (hospital, school) sized for the resident population before further development",
        suppresses: &[
            (Criterion::Infrastructure, Clause::EssentialServices),
            (Criterion::Population, Clause::CommunityServices),
        ],
    },
    CompoundRule {
        requires: &[
            (Criterion::Infrastructure, POOR),
            (Criterion::EconomicActivity, POOR),
        ],
        priority: Priority::Urgent,
        text: "Build roads and utilities that connect the area to economic centers",
        suppresses: &[
            (Criterion::Infrastructure, Clause::RoadsAndUtilities),
            (Criterion::EconomicActivity, Clause::EconomicConnectivity),
        ],
    },
    CompoundRule {
        requires: &[
            (Criterion::Infrastructure, POOR),
            (Criterion::Topography, POOR),
        ],
        priority: Priority::Urgent,
        text: "Steep terrain without services: prefer alternative sites for major development",
        suppresses: &[(Criterion::Topography, Clause::AlternativeSites)],
    },
    CompoundRule {
        requires: &[
            (Criterion::Infrastructure, MODERATE_OR_WORSE),
            (Criterion::EconomicActivity, GOOD_OR_BETTER),
        ],
        priority: Priority::Standard,
        text: "Economic activity is outgrowing local infrastructure; expand capacity to sustain it",
        suppresses: &[],
    },
];

/// Recommendations for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// Recommendations involving each criterion, most urgent first. Within
    /// a priority, compound items precede the criterion's own clauses.
    pub per_criterion: BTreeMap<Criterion, Vec<Recommendation>>,
    /// Every recommendation once, most urgent first.
    pub global: Vec<Recommendation>,
}

/// Produces recommendations from the status of each available criterion.
#[must_use]
pub fn synthesize(statuses: &BTreeMap<Criterion, Status>) -> Synthesis {
    let fired: Vec<&CompoundRule> = COMPOUND_RULES
        .iter()
        .filter(|rule| rule.matches(statuses))
        .collect();

    let compound: Vec<Recommendation> = fired.iter().map(|r| r.recommendation()).collect();

    let mut per_criterion = BTreeMap::new();
    let mut singles = Vec::new();

    for (criterion, &status) in statuses {
        if !criterion.is_registered() {
            log::debug!("No recommendation rules for {criterion}, skipping");
            per_criterion.insert(criterion.clone(), Vec::new());
            continue;
        }

        let priority = band_priority(status);
        let own: Vec<Recommendation> = single_rules(criterion, status)
            .iter()
            .filter(|rule| !fired.iter().any(|c| c.suppresses(criterion, rule.clause)))
            .map(|rule| Recommendation::single(criterion.clone(), priority, rule.text))
            .collect();

        let mut list: Vec<Recommendation> = compound
            .iter()
            .filter(|r| r.involves(criterion))
            .cloned()
            .collect();
        list.extend(own.iter().cloned());
        list.sort_by(by_urgency);

        singles.extend(own);
        per_criterion.insert(criterion.clone(), list);
    }

    let mut global = compound;
    global.extend(singles);
    global.sort_by(by_urgency);

    Synthesis {
        per_criterion,
        global,
    }
}

/// Priority first, then compound before single, then criterion order.
/// Used with a stable sort so rule order is kept within equal keys.
fn by_urgency(a: &Recommendation, b: &Recommendation) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.is_compound().cmp(&a.is_compound()))
        .then_with(|| a.criteria.first().cmp(&b.criteria.first()))
}
