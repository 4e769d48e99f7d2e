//! Prompt templates for speech generation and team brainstorming.

use crate::role::{Role, Team};

/// Prep-time analysis request for one team.
pub fn brainstorm_prompt(motion: &str, team: Team) -> String {
    format!(
        "You are a professional debater, now you are in a debate, the motion is {motion}, \
         and you are now going to brainstorm for the {team} team. You should provide motion \
         analysis, possible arguments, and possible arguments from other teams and counter \
         arguments. Think of as many arguments as possible for your team, always reason as \
         detailedly as possible.",
        team = team.display_name()
    )
}

/// Builds the full generation prompt for one AI-driven turn.
pub fn speech_prompt(motion: &str, role: Role, prior_speeches: &[String], clue: &str) -> String {
    let mut prompt = String::from(role_guidance(role));
    prompt.push_str(&format!("\n\nThe motion is: {motion}\n"));

    if !clue.is_empty() {
        prompt.push_str(&format!(
            "\nYour team's brainstorm notes from prep time:\n{clue}\n"
        ));
    }

    if !prior_speeches.is_empty() {
        prompt.push_str("\nSpeeches delivered so far, in speaking order:\n");
        for (i, speech) in prior_speeches.iter().enumerate() {
            let speaker = Role::SPEAKING_ORDER
                .get(i)
                .map(|r| r.display_name())
                .unwrap_or("Unknown");
            prompt.push_str(&format!("\n[{speaker}]: {speech}\n"));
        }
    }

    prompt.push_str(
        "\nSpeak naturally and passionately, as if delivering the speech aloud at a podium. \
         Output only your spoken words - no stage directions, no markdown formatting, no \
         acknowledgement of being an AI.",
    );
    prompt
}

fn role_guidance(role: Role) -> &'static str {
    match role {
        Role::PrimeMinister => {
            "You are the Prime Minister opening a British Parliamentary debate. Generate a \
             speech of 720 to 800 words. Describe the status quo vividly, identify the problem, \
             state your stance, define any key terms casually, explain your policy in plain \
             language, justify it morally, name the stakeholders who benefit, tag your two main \
             arguments clearly, and end with momentum. You have no previous speaker, so ignore \
             any speech list provided below."
        }
        Role::LeaderOfOpposition => {
            "You are the Leader of the Opposition responding to the Prime Minister in a British \
             Parliamentary debate. Generate a speech of 850 to 900 words. Begin by directly \
             rebutting the Prime Minister's key arguments, challenge the government's depiction \
             of the status quo and any problematic definitions, identify the harms and flaws of \
             the proposed policy, present your principled objections, show who suffers under \
             the policy, tag your two main points, and close decisively."
        }
        Role::DeputyPrimeMinister => {
            "You are the Deputy Prime Minister delivering the second government speech in a \
             British Parliamentary debate. Generate a speech of 850 to 900 words. Begin by \
             rebutting the Leader of Opposition, reaffirm and strengthen the Prime Minister's \
             case, defend your side's definitions, deepen the practicality and moral framing of \
             the policy, re-emphasize the stakeholders who benefit, introduce or deepen two key \
             arguments, and end with conviction."
        }
        Role::DeputyLeaderOfOpposition => {
            "You are the Deputy Leader of the Opposition delivering the second opposition \
             speech in a British Parliamentary debate. Generate a speech of 850 to 900 words. \
             Begin by rebutting the Deputy Prime Minister, reinforce your Leader's critiques, \
             deepen the analysis of the policy's harms and flawed assumptions, strengthen your \
             side's ethical objections, re-emphasize the negatively affected stakeholders, and \
             elaborate two key points before closing firmly."
        }
        Role::MemberOfGovernment => {
            "You are the Member of Government opening the Closing Government bench in a British \
             Parliamentary debate. Generate a speech of 850 to 900 words. Briefly rebut the \
             opening opposition, then bring a distinct extension: a new argument, a new lens, \
             or a deeper stakeholder analysis that the opening half did not offer, while \
             staying consistent with your side's case. Tag your extension clearly and explain \
             why it decides the debate."
        }
        Role::MemberOfOpposition => {
            "You are the Member of Opposition opening the Closing Opposition bench in a British \
             Parliamentary debate. Generate a speech of 850 to 900 words. Briefly rebut the \
             government benches, then bring a distinct extension for the opposition: a new \
             argument, a new lens, or a deeper harm analysis the opening half did not offer. \
             Tag your extension clearly and explain why it decides the debate."
        }
        Role::GovernmentWhip => {
            "You are the Government Whip closing the government case in a British Parliamentary \
             debate. Generate a speech of 850 to 900 words. Do not introduce new arguments. \
             Identify the central clashes of the debate, weigh both benches' contributions, \
             explain why the government analysis wins each clash with special credit to your \
             bench's extension, and summarize the government case persuasively."
        }
        Role::OppositionWhip => {
            "You are the Opposition Whip closing the opposition case in a British Parliamentary \
             debate. Generate a speech of 850 to 900 words. Do not introduce new arguments. \
             Identify the central clashes of the debate, weigh both benches' contributions, \
             explain why the opposition analysis wins each clash with special credit to your \
             bench's extension, and summarize the opposition case persuasively."
        }
    }
}
