//! Built-in answers for frequent questions
//!
//! Answers are opaque preformatted text and are returned verbatim.

pub(super) const CURATED_ANSWERS: &[(&str, &str)] = &[
    (
        "مرحبا",
        "👋 أهلاً وسهلاً!\n\nأنا مساعدك الذكي. يمكنني:\n• الإجابة على أسئلتك\n• مساعدتك في الكتابة والتلخيص\n• اقتراح أفكار إبداعية\n\nبماذا أستطيع مساعدتك اليوم؟",
    ),
    (
        "السلام عليكم",
        "وعليكم السلام ورحمة الله وبركاته 🌸\n\nكيف يمكنني مساعدتك اليوم؟",
    ),
    (
        "من أنت",
        "## 🤖 من أنا؟\n\nأنا مساعد ذكي للمحادثة.\n\n• أجيب من قاعدة معرفة منسقة عند توفرها\n• أستعين بنموذج لغوي للأسئلة الجديدة\n• لا أحتفظ بمحادثاتك بعد انتهاء الجلسة",
    ),
    (
        "شكرا",
        "العفو! 😊 سعيد بمساعدتك. لا تتردد في السؤال مرة أخرى.",
    ),
    (
        "hello",
        "👋 Hello!\n\nI'm your chat assistant. I can:\n• Answer questions\n• Help with writing and summaries\n• Suggest creative ideas\n\nWhat can I do for you today?",
    ),
    (
        "what can you do?",
        "## ✨ What I can do\n\n• **Answer questions** from a curated knowledge base\n• **Chat naturally** about almost any topic\n• **Help with writing**: drafts, rewrites, summaries\n• **Brainstorm** ideas and suggestions\n\nJust type your question to get started.",
    ),
    (
        "thank you",
        "You're welcome! 😊 Happy to help anytime.",
    ),
];
