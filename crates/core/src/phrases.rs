//! Fixed interviewer lines. Where several variants exist one is picked at
//! random so repeated interviews do not sound scripted.

use rand::seq::SliceRandom;

pub const GREETING_REPEAT: &str = "Can you tell me a little bit about yourself?";

pub const FALLBACK_QUESTION: &str =
    "Could you walk me through a project you have worked on recently and the role you played in it?";

pub const FALLBACK_RELEVANCE_ANSWER: &str =
    "That's a good question. I'd suggest discussing that with the hiring manager during the next round.";

pub const ABUSE_TERMINATION: &str = "I need to address something important. \
The language you just used is inappropriate for a professional interview setting. \
We maintain a respectful environment during all our interviews. \
Unfortunately, due to the use of inappropriate language, we will need to end this interview immediately. \
Please consider this a learning experience for future professional interactions. \
Best of luck in your career. Goodbye.";

const TIME_WARNINGS: &[&str] = &[
    "Alright, we are reaching the end of our scheduled time. Please take a moment to finish your thought. After this, I will give you a chance to ask any questions you may have.",
    "We're almost out of time for our interview. Wrap up your current point if you can. Then, I'll open the floor for any questions you might have.",
    "Time's ticking down; we have just a few seconds left. Please complete your response. Following that, feel free to ask me anything about the role or company.",
    "Okay, we're nearing the end of our allotted time. Go ahead and finish up. After that, you'll have an opportunity to ask questions about the position or team.",
];

const CLOSINGS: &[&str] = &[
    "That concludes the technical part of our interview. You did well! Before we wrap up, do you have any questions for me about the role, the team, or anything else you would like to know?",
    "We've covered the main interview questions. Great job on your responses! Now, is there anything you'd like to ask regarding the position, the team, or the company?",
    "The technical portion is complete. You handled it well! Before we end, do you have questions about the role, our team, or anything else?",
    "Alright, that's the end of the core interview questions. You did a fantastic job! Feel free to ask about the role, the team, or whatever else is on your mind.",
];

fn pick<'a>(variants: &'a [&'a str]) -> &'a str {
    variants
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

/// Opening line of the interview, addressed by first name.
pub fn greeting(first_name: &str, domain: &str) -> String {
    let variants = [
        format!(
            "Hey Mr. {first_name}, welcome to your {domain} interview. Thanks for joining me today, I'll be conducting your interview. I am excited to get started! Can you tell me a little bit about yourself?"
        ),
        format!(
            "Hello {first_name}, it's great to have you here for your {domain} interview. I'm thrilled to be your interviewer today. Let's dive right in. Could you share a bit about your background?"
        ),
        format!(
            "Hi {first_name}, welcome to the {domain} interview session. Thanks for participating; I'm looking forward to this. Shall we begin? Tell me a little about yourself."
        ),
        format!(
            "Greetings {first_name}, nice to meet you virtually for your {domain} interview. I'll be guiding you through this. Excited to learn more! Can you introduce yourself briefly?"
        ),
    ];
    variants
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}

pub fn time_warning() -> &'static str {
    pick(TIME_WARNINGS)
}

pub fn closing() -> &'static str {
    pick(CLOSINGS)
}

pub fn goodbye(name: &str) -> String {
    let variants = [
        format!(
            "Thank you so much for your time today, {name}. It was a pleasure speaking with you. We will review your interview and get back to you soon. Best of luck with everything! Have a wonderful day. Goodbye."
        ),
        format!(
            "Thanks for joining us today, {name}. It was great chatting with you. We'll be in touch after reviewing your interview. Wishing you all the best! Take care."
        ),
        format!(
            "Appreciate your time and effort, {name}. Pleasure to interview you. Expect to hear from us shortly with next steps. Good luck ahead! Farewell."
        ),
        format!(
            "Thank you for your participation, {name}. It was enjoyable speaking with you. We'll follow up soon with next steps. Best wishes! Goodbye."
        ),
    ];
    variants
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}

/// Prefix for the first generated question, after the self-introduction.
pub fn technical_transition(name: &str) -> String {
    format!("Okay Mr. {name}, let's dive into some technical background and skills. ")
}

pub fn relevant_farewell(answer: &str, name: &str) -> String {
    format!(
        "{answer} Thank you for that great question, {name}. \
It was a pleasure speaking with you today. \
We will review your interview and get back to you soon. \
Best of luck, {name}! Have a wonderful day. Goodbye."
    )
}

pub fn irrelevant_farewell(answer: &str, name: &str) -> String {
    format!(
        "{answer} Alright {name}, thank you for your time today. \
Best of luck with everything, {name}! Have a great day. Goodbye."
    )
}
