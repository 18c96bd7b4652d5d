use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::CronJob;
use crate::analyzer::kubescore::types::{Grade, TestScore};

pub fn cronjob_has_deadline(cronjob: &CronJob, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    if cronjob.spec.starting_deadline_seconds.is_none() {
        score.grade = Grade::Critical;
        score.add_comment(
            "",
            "The CronJob should have startingDeadlineSeconds configured",
            "This makes sure that jobs are automatically cancelled if they can not be scheduler",
        );
    }
    Ok(score)
}
