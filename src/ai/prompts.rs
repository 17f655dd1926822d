//! Prompt templates sent to the reviewer model.

pub fn code_review(language: &str, challenge: &str, code: &str) -> String {
    format!(
        "You are an expert code reviewer and programming mentor. Review the following code submission.\n\
         \n\
         Programming Language: {language}\n\
         Challenge: {challenge}\n\
         \n\
         Code:\n\
         ```{language}\n\
         {code}\n\
         ```\n\
         \n\
         Provide a detailed review covering:\n\
         1. ✅ Correctness: Does it solve the problem?\n\
         2. 💡 Code Quality: Is it clean, readable, and well-structured?\n\
         3. ⚡ Efficiency: Are there performance concerns?\n\
         4. 🎯 Best Practices: Does it follow language conventions?\n\
         5. 📝 Suggestions: What could be improved?\n\
         \n\
         Keep your feedback constructive, encouraging, and educational. Use emojis to make it engaging.\n\
         Format your response in a clear, structured way."
    )
}

pub fn interview_evaluation(question: &str, answer: &str) -> String {
    format!(
        "You are a technical interviewer evaluating a candidate's answer.\n\
         \n\
         Question: {question}\n\
         \n\
         Candidate's Answer:\n\
         {answer}\n\
         \n\
         Evaluate the answer based on:\n\
         1. ✅ Correctness: Is the answer technically accurate?\n\
         2. 💡 Completeness: Does it cover all important aspects?\n\
         3. 🎯 Clarity: Is the explanation clear and well-structured?\n\
         4. 📝 Areas for Improvement: What could be better?\n\
         \n\
         Provide constructive feedback with a score out of 10. Be encouraging but honest.\n\
         Use emojis to make the feedback engaging."
    )
}

pub fn hint(challenge: &str, language: &str) -> String {
    format!(
        "Generate a helpful hint for this coding challenge in {language}:\n\
         \n\
         Challenge: {challenge}\n\
         \n\
         Provide a hint that guides the user without giving away the complete solution. \
         Focus on the approach or key concepts."
    )
}
