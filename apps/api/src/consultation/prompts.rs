// Literal coach copy. These strings are part of the observable behavior and are
// stored verbatim in consultation logs; edit them only deliberately.

pub const DEFAULT_TOPIC: &str = "General Career Consultation";

pub const GREETING: &str = "Hello! I'm your AI career coach. How can I help you today? You can ask me about career transitions, skill development, job search strategies, or any other career-related questions.";

pub const CAREER_TRANSITION_ADVICE: &str = "Career transitions can be exciting! Here are some key steps: 1) Identify transferable skills from your current role, 2) Research the target industry and role requirements, 3) Network with professionals in your desired field, 4) Consider additional certifications or training if needed, 5) Update your resume to highlight relevant experience. What specific field are you interested in transitioning to?";

pub const RESUME_ADVICE: &str = "A strong resume should: 1) Start with a compelling summary highlighting your key strengths, 2) Use action verbs and quantify achievements, 3) Tailor content to each job application, 4) Keep it concise (1-2 pages), 5) Include relevant keywords from the job description. Would you like help with a specific section of your resume?";

pub const INTERVIEW_ADVICE: &str = "Interview preparation is crucial! Here are my tips: 1) Research the company thoroughly, 2) Practice common interview questions, 3) Prepare specific examples using the STAR method, 4) Dress appropriately, 5) Prepare thoughtful questions for the interviewer. Would you like to practice some interview questions?";

pub const SKILL_DEVELOPMENT_ADVICE: &str = "Continuous learning is key to career growth! Consider: 1) Identifying in-demand skills in your field, 2) Taking online courses (Coursera, Udemy, LinkedIn Learning), 3) Working on practical projects, 4) Seeking mentorship, 5) Attending industry events and webinars. What specific skills are you looking to develop?";

pub const SALARY_NEGOTIATION_ADVICE: &str = "Salary negotiation tips: 1) Research market rates for your role and location, 2) Know your worth and be confident, 3) Consider the entire compensation package, 4) Wait for the offer before discussing numbers, 5) Practice your negotiation conversation. Would you like help preparing for a salary negotiation?";

pub const GENERAL_ADVICE: &str = "That's a great question! Career development is a journey that requires planning and continuous improvement. I recommend: 1) Setting clear short-term and long-term goals, 2) Building a strong professional network, 3) Staying updated with industry trends, 4) Seeking feedback regularly, 5) Maintaining work-life balance. Could you tell me more about your specific situation so I can provide more targeted advice?";
