use crate::infra::{in_memory_board, Board};
use clap::Args;
use getjobandgo::board::{
    ApplicationDecision, ApplicationDraft, BoardError, JobDraft, JobType, Role, Session,
    SignupRequest, VerificationDecision,
};
use getjobandgo::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Stop after the company verification walkthrough.
    #[arg(long)]
    pub(crate) skip_applications: bool,
    /// Print the final job board as JSON.
    #[arg(long)]
    pub(crate) show_board: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let (board, _) = in_memory_board();
    let admin_profile = board.bootstrap_admin("admin@getjobandgo.local", "Administrator")?;
    let admin = Session::from(&admin_profile);

    println!("GetJobAndGo hiring demo");
    println!("\nCompany verification");
    let company = signup(&board, Role::Company, "talent@acme.example", "Acme Talent")?;
    println!("- Registered company {} (verification pending)", company.user_id);

    report(
        "Post while pending",
        board.create_job(Some(&company), draft("Graduate Software Engineer")),
    );
    let approved = board.review_company(Some(&admin), &company.user_id, VerificationDecision::Approve)?;
    println!(
        "- Admin review -> {}",
        approved.verification_status.label()
    );
    report(
        "Re-review after decision",
        board.review_company(Some(&admin), &company.user_id, VerificationDecision::Reject),
    );

    let job = board.create_job(Some(&company), draft("Graduate Software Engineer"))?;
    println!("- Posted job {} ({})", job.id, job.title);

    if args.skip_applications {
        return Ok(());
    }

    println!("\nApplications");
    let student = signup(&board, Role::Student, "meera@students.example", "Meera")?;
    let rival = signup(&board, Role::Company, "hr@rival.example", "Rival Corp")?;
    board.review_company(Some(&admin), &rival.user_id, VerificationDecision::Approve)?;

    let application_draft = ApplicationDraft {
        job_id: Some(job.id.clone()),
        student_id: Some(student.user_id.clone()),
        cover_letter: "Keen to start in July.".to_string(),
    };
    let application = board.create_application(Some(&student), application_draft.clone())?;
    println!(
        "- {} applied to {} -> {}",
        student.user_id,
        job.id,
        application.status.label()
    );
    report(
        "Apply a second time",
        board.create_application(Some(&student), application_draft),
    );
    report(
        "Rival company shortlists",
        board.set_application_status(Some(&rival), &application.id, ApplicationDecision::Shortlist),
    );
    report(
        "Owning company shortlists",
        board
            .set_application_status(Some(&company), &application.id, ApplicationDecision::Shortlist)
            .map(|updated| updated.status.label()),
    );

    board.close_job(Some(&company), &job.id)?;
    println!("- Closed job {}", job.id);
    report(
        "Decide after closing",
        board.set_application_status(Some(&company), &application.id, ApplicationDecision::Reject),
    );

    if args.show_board {
        let listing = board.list_jobs(Some(&admin))?;
        match serde_json::to_string_pretty(&listing) {
            Ok(json) => println!("\nJob board (admin view):\n{json}"),
            Err(err) => println!("\nJob board unavailable: {err}"),
        }
    }

    Ok(())
}

fn signup(board: &Board, role: Role, email: &str, name: &str) -> Result<Session, BoardError> {
    let outcome = board.signup(SignupRequest {
        email: email.to_string(),
        full_name: name.to_string(),
        role,
        company_name: None,
    })?;
    Ok(Session::from(&outcome.profile))
}

fn draft(title: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: "Join the platform team building our hiring APIs.".to_string(),
        requirements: "Rust or Go, SQL".to_string(),
        location: "Chennai".to_string(),
        job_type: Some(JobType::FullTime),
        salary_range: "6-8 LPA".to_string(),
    }
}

fn report<T: std::fmt::Debug>(step: &str, result: Result<T, BoardError>) {
    match result {
        Ok(value) => println!("- {step}: ok ({value:?})"),
        Err(err) => println!("- {step}: refused [{}] {err}", err.code()),
    }
}
