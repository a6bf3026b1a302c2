mod common;

use kpi_dashboard::{
    dimension::Dimension,
    error::QueryError,
    filter::{Selection, apply},
    report::{executive_overview, geography, group_detail, projects, strategy},
};

use common::plan_snapshot;

#[test]
fn overview_headlines_match_the_fixture() {
    let snapshot = plan_snapshot();
    let subset = apply(snapshot.records(), &Selection::all());
    let view = executive_overview(&subset).expect("overview");

    assert_eq!(view.record_count, 6);
    assert_eq!(view.overall_mean, Some(87.0));
    assert_eq!(view.best_pillar.as_ref().map(|r| r.key.as_str()), Some("Groei"));
    assert_eq!(view.best_focus_area.as_ref().map(|r| r.key.as_str()), Some("Onderwys"));
    assert_eq!(
        view.top_communities
            .iter()
            .map(|r| r.key.as_str())
            .collect::<Vec<_>>(),
        vec!["Soweto", "Thohoyandou", "Soshanguve", "Mamelodi", "Polokwane"]
    );
}

#[test]
fn overview_of_an_empty_subset_has_no_headlines() {
    let view = executive_overview(&[]).expect("overview");
    assert_eq!(view.record_count, 0);
    assert_eq!(view.overall_mean, None);
    assert!(view.best_pillar.is_none());
    assert!(view.top_communities.is_empty());
}

#[test]
fn strategy_orders_groups_from_weakest() {
    let snapshot = plan_snapshot();
    let subset = apply(snapshot.records(), &Selection::all());
    let view = strategy(&subset, Dimension::FocusArea).expect("strategy");
    assert_eq!(
        view.groups.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
        vec!["Water", "Gesondheid", "Onderwys"]
    );

    let water = group_detail(&subset, Dimension::FocusArea, "Water");
    assert_eq!(water.len(), 2);
}

#[test]
fn geography_details_the_requested_province() {
    let snapshot = plan_snapshot();
    let subset = apply(snapshot.records(), &Selection::all());
    let view = geography(&subset, Some("Gauteng")).expect("geography");
    assert_eq!(view.provinces.len(), 3);
    assert_eq!(
        view.districts.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
        vec!["Tshwane", "Johannesburg"]
    );
    assert_eq!(
        view.communities.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
        vec!["Mamelodi", "Soweto"]
    );

    let default_view = geography(&subset, None).expect("geography");
    assert_eq!(default_view.province.as_deref(), Some("Limpopo"));
}

#[test]
fn projects_combine_search_and_owner_filters() {
    let snapshot = plan_snapshot();
    let subset = apply(snapshot.records(), &Selection::all());

    let view = projects(&subset, "", &["Thabo".to_string()]).expect("projects");
    assert_eq!(
        view.projects.iter().map(|r| r.description.as_str()).collect::<Vec<_>>(),
        vec!["Borehole repairs", "Reading club", "Pipe upgrades"]
    );
    assert_eq!(view.owners.len(), 3);

    let clinics = projects(&subset, "clinic", &[]).expect("projects");
    assert_eq!(
        clinics.projects.iter().map(|r| r.description.as_str()).collect::<Vec<_>>(),
        vec!["Clinic outreach", "Mobile clinic"]
    );
}

#[test]
fn strategy_only_breaks_down_pillars_and_focus_areas() {
    let snapshot = plan_snapshot();
    let subset = apply(snapshot.records(), &Selection::all());
    assert_eq!(strategy(&subset, Dimension::Pillar).expect("pillars").groups.len(), 2);

    let err = strategy(&subset, Dimension::Province).unwrap_err();
    assert_eq!(
        err,
        QueryError::UnsupportedDimension {
            dimension: "province".into(),
            view: "strategy",
        }
    );
}
