use dashboard::evaluator::{Verdict, evaluate_forecast};
use dashboard::milestone::MilestoneStage::{self, *};

const ALL: [MilestoneStage; 7] = [Unopened, Opened, Pg, IpgMinus, Ipg, IpgPlus, Unrecognized];

fn assert_verdict(actual: MilestoneStage, forecast: MilestoneStage, expected: Verdict) {
    assert_eq!(
        evaluate_forecast(Some(actual), Some(forecast)),
        Some(expected),
        "actual {} against forecast {}",
        actual,
        forecast
    );
}

#[test]
fn absent_side_gives_no_verdict() {
    for stage in ALL {
        assert_eq!(evaluate_forecast(Some(stage), None), None);
        assert_eq!(evaluate_forecast(None, Some(stage)), None);
    }
    assert_eq!(evaluate_forecast(None, None), None);
}

#[test]
fn unopened_forecast_is_met_by_any_report() {
    for stage in ALL {
        assert_verdict(stage, Unopened, Verdict::Met);
    }
}

#[test]
fn opened_forecast() {
    assert_verdict(Unopened, Opened, Verdict::Missed);
    assert_verdict(Opened, Opened, Verdict::Met);
    assert_verdict(Pg, Opened, Verdict::Met);
    assert_verdict(IpgPlus, Opened, Verdict::Met);
}

#[test]
fn ipg_minus_ties_with_ipg_both_ways() {
    assert_verdict(IpgMinus, Ipg, Verdict::Met);
    assert_verdict(Ipg, IpgMinus, Verdict::Met);
}

#[test]
fn ranked_comparisons() {
    assert_verdict(IpgPlus, IpgPlus, Verdict::Met);
    assert_verdict(Pg, IpgPlus, Verdict::Missed);
    assert_verdict(IpgPlus, Pg, Verdict::Met);
    assert_verdict(Ipg, IpgPlus, Verdict::Missed);
    assert_verdict(Opened, Pg, Verdict::Missed);
    assert_verdict(Unopened, Pg, Verdict::Missed);
}

#[test]
fn unrecognized_labels_rank_zero() {
    let odd = MilestoneStage::parse("emerging");
    assert_eq!(odd, Unrecognized);
    assert_verdict(odd, Pg, Verdict::Missed);
    assert_verdict(odd, Opened, Verdict::Met);
}

#[test]
fn higher_actual_never_loses_a_met_verdict() {
    let ranked = [Pg, IpgMinus, Ipg, IpgPlus];
    for forecast in ranked {
        for low in ranked {
            for high in ranked.iter().filter(|h| h.rank() >= low.rank()) {
                if evaluate_forecast(Some(low), Some(forecast)) == Some(Verdict::Met) {
                    assert_verdict(*high, forecast, Verdict::Met);
                }
            }
        }
    }
}

#[test]
fn opened_and_unopened_are_matched_by_category() {
    let opened = MilestoneStage::parse("Opened (2023)");
    let unopened = MilestoneStage::parse("Not opened yet");
    assert_eq!(opened, Opened);
    assert_eq!(unopened, Unopened);

    assert_verdict(unopened, opened, Verdict::Missed);
    assert_verdict(MilestoneStage::parse("PG cluster"), opened, Verdict::Met);
    assert_verdict(Pg, unopened, Verdict::Met);
}

#[test]
fn stage_words_inside_other_words_are_not_stages() {
    let odd = MilestoneStage::parse("upgrading");
    assert_eq!(odd, Unrecognized);
    assert_verdict(odd, Pg, Verdict::Missed);
}
